use common::auth::{EntityKind, Operation};
use common::domain::{
    group_by_owner, Activity, ActivityExclusion, Company, Contact, CountAssociationsRepoInput,
    CrmRepositories, DomainResult, ListPoliciesRepoInput, ListRelatedActivitiesRepoInput,
    ListRelatedRepoInput, ListUsersRepoInput, PolicyGrant, Project, RecordScope, Session, User,
};
use std::collections::HashMap;

use crate::domain::RecordAccess;

/// Loads records associated with a batch of owner records.
///
/// Related records are reachable within the head of the session; only
/// `readable_companies` applies the company read scope on top.
pub struct RelatedLoader<'a> {
    repositories: &'a CrmRepositories,
    access: &'a RecordAccess,
    session: &'a Session,
}

impl<'a> RelatedLoader<'a> {
    pub fn new(
        repositories: &'a CrmRepositories,
        access: &'a RecordAccess,
        session: &'a Session,
    ) -> Self {
        Self {
            repositories,
            access,
            session,
        }
    }

    fn related_input(
        &self,
        owner_kind: EntityKind,
        owner_ids: &[String],
        scope: RecordScope,
        limit_per_owner: Option<i64>,
    ) -> ListRelatedRepoInput {
        ListRelatedRepoInput {
            owner_kind,
            owner_ids: owner_ids.to_vec(),
            scope,
            limit_per_owner,
        }
    }

    fn head_scope(&self) -> RecordScope {
        RecordScope::head(self.session.head_id())
    }

    pub async fn contacts(
        &self,
        owner_kind: EntityKind,
        owner_ids: &[String],
        limit_per_owner: Option<i64>,
    ) -> DomainResult<HashMap<String, Vec<Contact>>> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let input =
            self.related_input(owner_kind, owner_ids, self.head_scope(), limit_per_owner);
        let related = self.repositories.contacts.list_related_contacts(input).await?;
        Ok(group_by_owner(related))
    }

    pub async fn companies(
        &self,
        owner_kind: EntityKind,
        owner_ids: &[String],
    ) -> DomainResult<HashMap<String, Vec<Company>>> {
        self.load_companies(owner_kind, owner_ids, self.head_scope())
            .await
    }

    /// Companies the session may read
    pub async fn readable_companies(
        &self,
        owner_kind: EntityKind,
        owner_ids: &[String],
    ) -> DomainResult<HashMap<String, Vec<Company>>> {
        let scope = self
            .access
            .scope(self.session, EntityKind::Company, Operation::Read);
        self.load_companies(owner_kind, owner_ids, scope).await
    }

    async fn load_companies(
        &self,
        owner_kind: EntityKind,
        owner_ids: &[String],
        scope: RecordScope,
    ) -> DomainResult<HashMap<String, Vec<Company>>> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let input = self.related_input(owner_kind, owner_ids, scope, None);
        let related = self.repositories.companies.list_related_companies(input).await?;
        Ok(group_by_owner(related))
    }

    pub async fn projects(
        &self,
        owner_kind: EntityKind,
        owner_ids: &[String],
    ) -> DomainResult<HashMap<String, Vec<Project>>> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let input = self.related_input(owner_kind, owner_ids, self.head_scope(), None);
        let related = self.repositories.projects.list_related_projects(input).await?;
        Ok(group_by_owner(related))
    }

    /// Activities per owner, latest date first
    pub async fn activities(
        &self,
        owner_kind: EntityKind,
        owner_ids: &[String],
        exclusion: Option<ActivityExclusion>,
    ) -> DomainResult<HashMap<String, Vec<Activity>>> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let input = ListRelatedActivitiesRepoInput {
            related: self.related_input(owner_kind, owner_ids, self.head_scope(), None),
            exclusion,
        };
        let related = self.repositories.activities.list_related_activities(input).await?;
        Ok(group_by_owner(related))
    }

    /// Association counts per owner within the head; owners without
    /// associations are absent from the map
    pub async fn counts(
        &self,
        owner_kind: EntityKind,
        owner_ids: &[String],
        related_kind: EntityKind,
    ) -> DomainResult<HashMap<String, i64>> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let counts = self
            .repositories
            .associations
            .count_associations(CountAssociationsRepoInput {
                owner_kind,
                owner_ids: owner_ids.to_vec(),
                related_kind,
                head_id: self.session.head_id().to_string(),
            })
            .await?;
        Ok(counts
            .into_iter()
            .map(|count| (count.owner_id, count.count))
            .collect())
    }

    /// Policy rows of the session user, grouped by record
    pub async fn own_policies(
        &self,
        entity: EntityKind,
        record_ids: &[String],
    ) -> DomainResult<HashMap<String, Vec<PolicyGrant>>> {
        if record_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let grants = self
            .repositories
            .policies
            .list_policies(ListPoliciesRepoInput {
                entity,
                head_id: self.session.head_id().to_string(),
                user_id: self.session.user_id.clone(),
                record_ids: record_ids.to_vec(),
            })
            .await?;

        let mut grouped: HashMap<String, Vec<PolicyGrant>> = HashMap::new();
        for grant in grants {
            grouped.entry(grant.record_id.clone()).or_default().push(grant);
        }
        Ok(grouped)
    }

    /// Users of the head keyed by ID
    pub async fn users(&self, user_ids: Vec<String>) -> DomainResult<HashMap<String, User>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = self
            .repositories
            .users
            .list_users(ListUsersRepoInput {
                head_id: self.session.head_id().to_string(),
                user_ids,
            })
            .await?;
        Ok(users.into_iter().map(|user| (user.id.clone(), user)).collect())
    }
}
