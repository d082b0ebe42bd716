use crate::domain::result::{DomainError, DomainResult};
use crate::domain::{Contact, ListRelatedRepoInput, RecordScope};
use async_trait::async_trait;

/// Which directed edges a link operation touches, relative to the source contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    Both,
    Outgoing,
    Incoming,
}

impl LinkDirection {
    pub fn includes_outgoing(&self) -> bool {
        matches!(self, LinkDirection::Both | LinkDirection::Outgoing)
    }

    pub fn includes_incoming(&self) -> bool {
        matches!(self, LinkDirection::Both | LinkDirection::Incoming)
    }
}

impl TryFrom<i32> for LinkDirection {
    type Error = DomainError;

    fn try_from(mode: i32) -> Result<Self, Self::Error> {
        match mode {
            0 => Ok(LinkDirection::Both),
            1 => Ok(LinkDirection::Outgoing),
            2 => Ok(LinkDirection::Incoming),
            other => Err(DomainError::InvalidLinkMode(other)),
        }
    }
}

/// Input for adding or removing directed edges between two contacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactLinkRepoInput {
    pub source_id: String,
    pub target_id: String,
    pub direction: LinkDirection,
    /// The source must match this scope
    pub source_scope: RecordScope,
    /// When set, the target must match this scope as well
    pub target_scope: Option<RecordScope>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationSide {
    /// Edge from the owner contact to the related contact
    Outgoing,
    /// Edge from the related contact to the owner contact
    Incoming,
}

/// A related contact reached over a directed edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRelation {
    pub contact_id: String,
    pub side: RelationSide,
    pub contact: Contact,
}

/// Repository trait for directed contact-to-contact edges
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContactRelationRepository: Send + Sync {
    /// Create the requested edges; existing edges are left untouched
    async fn add_links(&self, input: ContactLinkRepoInput) -> DomainResult<Contact>;

    /// Remove the requested edges; missing edges are ignored
    async fn remove_links(&self, input: ContactLinkRepoInput) -> DomainResult<Contact>;

    /// List incoming and outgoing relations of the given contacts
    async fn list_relations(
        &self,
        input: ListRelatedRepoInput,
    ) -> DomainResult<Vec<ContactRelation>>;
}
