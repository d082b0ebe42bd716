use common::auth::{AuthorizationProvider, EntityKind, Operation};
use common::domain::{
    ActivityOwnerCheckRepoInput, AssociationRepoInput, CrmRepositories, DomainError,
    DomainResult, GetActivityRepoInput, GetCompanyRepoInput, GetContactRepoInput,
    GetProjectRepoInput, ListPoliciesRepoInput, RecordScope, Session,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Whether an association edit adds or removes links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationEdit {
    Connect,
    Disconnect,
}

/// Permission checks against stored records, shared by the CRM services
#[derive(Clone)]
pub struct RecordAccess {
    repositories: CrmRepositories,
    authorization_provider: Arc<dyn AuthorizationProvider>,
}

impl RecordAccess {
    pub fn new(
        repositories: CrmRepositories,
        authorization_provider: Arc<dyn AuthorizationProvider>,
    ) -> Self {
        Self {
            repositories,
            authorization_provider,
        }
    }

    pub fn scope(&self, session: &Session, entity: EntityKind, operation: Operation) -> RecordScope {
        self.authorization_provider.scope(session, entity, operation)
    }

    /// Creation is decided by the role alone
    pub fn require_create(&self, session: &Session, entity: EntityKind) -> DomainResult<()> {
        self.authorization_provider
            .require_permission(session, entity, Operation::Create, &[])
    }

    /// Require the operation on one record of the session's head.
    ///
    /// Fails with a not-found error when the record is not in the head and
    /// with `PermissionDenied` when neither the role nor a policy row of the
    /// user grants the operation.
    #[instrument(
        skip(self, session),
        fields(user_id = %session.user_id, entity = entity.as_str(), operation = operation.as_str())
    )]
    pub async fn require(
        &self,
        session: &Session,
        entity: EntityKind,
        operation: Operation,
        record_id: &str,
    ) -> DomainResult<()> {
        let head_scope = RecordScope::head(session.head_id());
        if !self.exists(entity, record_id, head_scope).await? {
            return Err(DomainError::not_found(entity, record_id));
        }

        let grants = self
            .repositories
            .policies
            .list_policies(ListPoliciesRepoInput {
                entity,
                head_id: session.head_id().to_string(),
                user_id: session.user_id.clone(),
                record_ids: vec![record_id.to_string()],
            })
            .await?;

        let denied = match self
            .authorization_provider
            .require_permission(session, entity, operation, &grants)
        {
            Ok(()) => return Ok(()),
            Err(denied) => denied,
        };

        if entity == EntityKind::Activity
            && operation == Operation::Delete
            && self.authorization_provider.allows_connected_activity_delete(session)
        {
            let linked = self
                .repositories
                .activities
                .is_linked_to_owned_contact(ActivityOwnerCheckRepoInput {
                    activity_id: record_id.to_string(),
                    head_id: session.head_id().to_string(),
                    user_id: session.user_id.clone(),
                })
                .await?;
            if linked {
                debug!("activity delete allowed through an owned contact");
                return Ok(());
            }
        }

        Err(denied)
    }

    /// Check edit permission on the owner, then connect or disconnect the
    /// related records in one transaction
    #[instrument(
        skip(self, session, related_ids),
        fields(owner = owner_kind.as_str(), owner_id = %owner_id, related = related_kind.as_str(), count = related_ids.len())
    )]
    pub async fn edit_associations(
        &self,
        session: &Session,
        edit: AssociationEdit,
        owner_kind: EntityKind,
        owner_id: &str,
        related_kind: EntityKind,
        related_ids: Vec<String>,
    ) -> DomainResult<()> {
        self.require(session, owner_kind, Operation::Edit, owner_id)
            .await?;

        let input = AssociationRepoInput {
            owner_kind,
            owner_id: owner_id.to_string(),
            owner_scope: self.scope(session, owner_kind, Operation::Edit),
            related_kind,
            related_ids,
        };

        match edit {
            AssociationEdit::Connect => self.repositories.associations.connect(input).await,
            AssociationEdit::Disconnect => self.repositories.associations.disconnect(input).await,
        }
    }

    async fn exists(
        &self,
        entity: EntityKind,
        record_id: &str,
        scope: RecordScope,
    ) -> DomainResult<bool> {
        let id = record_id.to_string();
        let found = match entity {
            EntityKind::Contact => self
                .repositories
                .contacts
                .get_contact(GetContactRepoInput {
                    contact_id: id,
                    scope,
                })
                .await?
                .is_some(),
            EntityKind::Company => self
                .repositories
                .companies
                .get_company(GetCompanyRepoInput {
                    company_id: id,
                    scope,
                })
                .await?
                .is_some(),
            EntityKind::Project => self
                .repositories
                .projects
                .get_project(GetProjectRepoInput {
                    project_id: id,
                    scope,
                })
                .await?
                .is_some(),
            EntityKind::Activity => self
                .repositories
                .activities
                .get_activity(GetActivityRepoInput {
                    activity_id: id,
                    scope,
                })
                .await?
                .is_some(),
        };
        Ok(found)
    }
}
