use chrono::{DateTime, Utc};
use common::auth::{EntityKind, Operation};
use common::domain::{
    Activity, ActivityType, CreateActivityRepoInputWithId, CrmRepositories,
    DeleteActivityRepoInput, DomainError, DomainResult, ListActivitiesRepoInput, Session,
};
use common::garde::non_empty_ids;
use garde::Validate;
use tracing::{debug, instrument};

use crate::domain::{blank_to_none, RecordAccess};

/// Request to record an activity. At least one contact, company or project
/// must be named.
#[derive(Debug, Clone, Default, Validate)]
pub struct CreateActivityRequest {
    #[garde(skip)]
    pub description: Option<String>,
    /// Defaults to `NOTE`
    #[garde(skip)]
    pub activity_type: Option<String>,
    /// Defaults to the time of the request
    #[garde(skip)]
    pub date: Option<DateTime<Utc>>,
    #[garde(custom(non_empty_ids))]
    pub contact_ids: Vec<String>,
    #[garde(custom(non_empty_ids))]
    pub company_ids: Vec<String>,
    #[garde(custom(non_empty_ids))]
    pub project_ids: Vec<String>,
}

impl CreateActivityRequest {
    fn names_an_owner(&self) -> bool {
        !(self.contact_ids.is_empty() && self.company_ids.is_empty() && self.project_ids.is_empty())
    }
}

#[derive(Debug, Clone, Validate)]
pub struct DeleteActivityRequest {
    #[garde(length(min = 1))]
    pub activity_id: String,
}

/// Domain service for activities
pub struct ActivityService {
    repositories: CrmRepositories,
    access: RecordAccess,
}

impl ActivityService {
    pub fn new(repositories: CrmRepositories, access: RecordAccess) -> Self {
        Self {
            repositories,
            access,
        }
    }

    /// List activities, latest date first
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub async fn list_activities(&self, session: &Session) -> DomainResult<Vec<Activity>> {
        self.repositories
            .activities
            .list_activities(ListActivitiesRepoInput {
                scope: self.access.scope(session, EntityKind::Activity, Operation::Read),
            })
            .await
    }

    /// Create an activity linked to the named records of the head
    #[instrument(
        skip(self, session, request),
        fields(
            user_id = %session.user_id,
            contacts = request.contact_ids.len(),
            companies = request.company_ids.len(),
            projects = request.project_ids.len(),
        )
    )]
    pub async fn create_activity(
        &self,
        session: &Session,
        request: CreateActivityRequest,
    ) -> DomainResult<Activity> {
        common::garde::validate_struct(&request)?;
        if !request.names_an_owner() {
            return Err(DomainError::ValidationError(
                "Either company, contact or project must be selected".to_string(),
            ));
        }
        let activity_type = request
            .activity_type
            .as_deref()
            .map(str::parse::<ActivityType>)
            .transpose()?
            .unwrap_or_default();

        self.access.require_create(session, EntityKind::Activity)?;

        let activity_id = xid::new().to_string();
        debug!(activity_id = %activity_id, activity_type = %activity_type, "creating activity");

        self.repositories
            .activities
            .create_activity(CreateActivityRepoInputWithId {
                id: activity_id,
                head_id: session.head_id().to_string(),
                created_by: session.user_id.clone(),
                description: blank_to_none(request.description),
                activity_type,
                date: request.date.unwrap_or_else(Utc::now),
                contact_ids: request.contact_ids,
                company_ids: request.company_ids,
                project_ids: request.project_ids,
            })
            .await
    }

    /// Delete an activity. Besides the role capability and policy rows, a
    /// role may allow deleting activities linked to a contact the user owns.
    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, activity_id = %request.activity_id))]
    pub async fn delete_activity(
        &self,
        session: &Session,
        request: DeleteActivityRequest,
    ) -> DomainResult<Activity> {
        common::garde::validate_struct(&request)?;
        self.access
            .require(session, EntityKind::Activity, Operation::Delete, &request.activity_id)
            .await?;

        self.repositories
            .activities
            .delete_activity(DeleteActivityRepoInput {
                activity_id: request.activity_id,
                scope: self.access.scope(session, EntityKind::Activity, Operation::Delete),
            })
            .await
    }
}
