use crate::domain::result::DomainResult;
use crate::domain::{
    Activity, CompanyDetails, ListRelatedRepoInput, PolicyGrant, ProjectDetails, RecordScope,
    Related, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Contact domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: String,
    pub head_id: String,
    /// Owning user
    pub user_id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub info: Option<String>,
    pub mobile: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Contact with the relations requested by the caller.
/// `None` means the relation was not requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub contact: Contact,
    pub user: Option<Option<User>>,
    pub companies: Option<Vec<CompanyDetails>>,
    pub activities: Option<Vec<Activity>>,
    pub projects: Option<Vec<ProjectDetails>>,
    pub policies: Option<Vec<PolicyGrant>>,
    pub incoming_relations: Option<Vec<Contact>>,
    pub outgoing_relations: Option<Vec<Contact>>,
}

impl ContactDetails {
    pub fn new(contact: Contact) -> Self {
        Self {
            contact,
            user: None,
            companies: None,
            activities: None,
            projects: None,
            policies: None,
            incoming_relations: None,
            outgoing_relations: None,
        }
    }
}

/// Relations to load alongside contacts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactIncludes {
    pub user: bool,
    pub companies: bool,
    pub activities: bool,
    pub projects: bool,
    pub policies: bool,
    pub relations: bool,
}

/// Internal input with generated ID for creating a contact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateContactRepoInputWithId {
    pub id: String,
    pub head_id: String,
    /// Creator; becomes the owner and receives an edit/delete policy
    pub created_by: String,
    pub name: String,
    pub email: Option<String>,
    pub info: Option<String>,
    pub mobile: Option<String>,
    pub company_ids: Vec<String>,
}

/// Input for fetching a contact within a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetContactRepoInput {
    pub contact_id: String,
    pub scope: RecordScope,
}

/// Input for listing contacts within a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListContactsRepoInput {
    pub scope: RecordScope,
}

/// Input for updating a contact; `company_ids` are connected, not replaced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateContactRepoInput {
    pub contact_id: String,
    pub scope: RecordScope,
    pub name: String,
    pub email: Option<String>,
    pub info: Option<String>,
    pub mobile: Option<String>,
    pub company_ids: Vec<String>,
}

/// Input for deleting a contact within a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteContactRepoInput {
    pub contact_id: String,
    pub scope: RecordScope,
}

/// Repository trait for contact storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Create a contact and connect the given companies atomically
    async fn create_contact(&self, input: CreateContactRepoInputWithId) -> DomainResult<Contact>;

    /// Get a contact visible within the scope
    async fn get_contact(&self, input: GetContactRepoInput) -> DomainResult<Option<Contact>>;

    /// List contacts visible within the scope, newest first
    async fn list_contacts(&self, input: ListContactsRepoInput) -> DomainResult<Vec<Contact>>;

    /// Update a contact matching the scope
    async fn update_contact(&self, input: UpdateContactRepoInput) -> DomainResult<Contact>;

    /// Delete a contact matching the scope and return it
    async fn delete_contact(&self, input: DeleteContactRepoInput) -> DomainResult<Contact>;

    /// List contacts associated with the given owner records
    async fn list_related_contacts(
        &self,
        input: ListRelatedRepoInput,
    ) -> DomainResult<Vec<Related<Contact>>>;
}
