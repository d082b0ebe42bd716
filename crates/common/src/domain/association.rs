use crate::auth::EntityKind;
use crate::domain::result::DomainResult;
use crate::domain::RecordScope;
use async_trait::async_trait;

/// Input for connecting or disconnecting records to an owner record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationRepoInput {
    pub owner_kind: EntityKind,
    pub owner_id: String,
    /// The owner must match this scope for the mutation to apply
    pub owner_scope: RecordScope,
    pub related_kind: EntityKind,
    pub related_ids: Vec<String>,
}

/// Input for counting associations of a set of owner records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountAssociationsRepoInput {
    pub owner_kind: EntityKind,
    pub owner_ids: Vec<String>,
    pub related_kind: EntityKind,
    pub head_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationCount {
    pub owner_id: String,
    pub count: i64,
}

/// Repository trait for many-to-many associations between records
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AssociationRepository: Send + Sync {
    /// Connect related records to the owner in one transaction.
    /// Fails with a not-found error, writing nothing, when the owner or any
    /// related ID is missing from the head.
    async fn connect(&self, input: AssociationRepoInput) -> DomainResult<()>;

    /// Disconnect related records from the owner in one transaction
    async fn disconnect(&self, input: AssociationRepoInput) -> DomainResult<()>;

    /// Count related records per owner; owners without associations are omitted
    async fn count_associations(
        &self,
        input: CountAssociationsRepoInput,
    ) -> DomainResult<Vec<AssociationCount>>;
}
