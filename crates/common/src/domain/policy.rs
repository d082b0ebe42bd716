use crate::auth::EntityKind;
use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Per-record grant for one user. The row itself grants read access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyGrant {
    pub user_id: String,
    pub record_id: String,
    pub can_edit: bool,
    pub can_delete: bool,
}

/// Input for listing the policy rows of a user on a set of records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPoliciesRepoInput {
    pub entity: EntityKind,
    pub head_id: String,
    pub user_id: String,
    pub record_ids: Vec<String>,
}

/// Repository trait for policy lookups
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn list_policies(&self, input: ListPoliciesRepoInput) -> DomainResult<Vec<PolicyGrant>>;
}
