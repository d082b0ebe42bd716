use crate::domain::result::DomainResult;
use crate::domain::{
    Activity, Contact, ListRelatedRepoInput, ProjectDetails, RecordScope, Related,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Company domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub id: String,
    pub head_id: String,
    pub name: String,
    pub info: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Company with optionally loaded relations and counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyDetails {
    pub company: Company,
    pub contacts: Option<Vec<Contact>>,
    pub projects: Option<Vec<ProjectDetails>>,
    pub activities: Option<Vec<Activity>>,
    pub contact_count: Option<i64>,
    pub project_count: Option<i64>,
}

impl CompanyDetails {
    pub fn new(company: Company) -> Self {
        Self {
            company,
            contacts: None,
            projects: None,
            activities: None,
            contact_count: None,
            project_count: None,
        }
    }
}

/// Internal input with generated ID for creating a company
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCompanyRepoInputWithId {
    pub id: String,
    pub head_id: String,
    pub created_by: String,
    pub name: String,
    pub info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetCompanyRepoInput {
    pub company_id: String,
    pub scope: RecordScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCompaniesRepoInput {
    pub scope: RecordScope,
}

/// Partial update: `None` fields keep their stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCompanyRepoInput {
    pub company_id: String,
    pub scope: RecordScope,
    pub name: Option<String>,
    /// `Some(None)` clears the stored info
    pub info: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCompanyRepoInput {
    pub company_id: String,
    pub scope: RecordScope,
}

/// Repository trait for company storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn create_company(&self, input: CreateCompanyRepoInputWithId) -> DomainResult<Company>;

    async fn get_company(&self, input: GetCompanyRepoInput) -> DomainResult<Option<Company>>;

    /// List companies visible within the scope, newest first
    async fn list_companies(&self, input: ListCompaniesRepoInput) -> DomainResult<Vec<Company>>;

    async fn update_company(&self, input: UpdateCompanyRepoInput) -> DomainResult<Company>;

    async fn delete_company(&self, input: DeleteCompanyRepoInput) -> DomainResult<Company>;

    /// List companies associated with the given owner records
    async fn list_related_companies(
        &self,
        input: ListRelatedRepoInput,
    ) -> DomainResult<Vec<Related<Company>>>;
}
