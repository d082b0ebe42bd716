use std::fmt;
use std::str::FromStr;

use crate::domain::result::{DomainError, DomainResult};
use crate::domain::{Activity, Company, Contact, ListRelatedRepoInput, RecordScope, Related};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Lifecycle state of a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    OnHold,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planned => "PLANNED",
            ProjectStatus::InProgress => "IN_PROGRESS",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::OnHold => "ON_HOLD",
            ProjectStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLANNED" => Ok(ProjectStatus::Planned),
            "IN_PROGRESS" => Ok(ProjectStatus::InProgress),
            "COMPLETED" => Ok(ProjectStatus::Completed),
            "ON_HOLD" => Ok(ProjectStatus::OnHold),
            "CANCELLED" => Ok(ProjectStatus::Cancelled),
            other => Err(DomainError::InvalidProjectStatus(other.to_string())),
        }
    }
}

/// Project domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub head_id: String,
    pub name: String,
    pub info: Option<String>,
    pub status: ProjectStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Project with optionally loaded relations and counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDetails {
    pub project: Project,
    pub contacts: Option<Vec<Contact>>,
    pub companies: Option<Vec<Company>>,
    pub activities: Option<Vec<Activity>>,
    pub contact_count: Option<i64>,
    pub company_count: Option<i64>,
}

impl ProjectDetails {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            contacts: None,
            companies: None,
            activities: None,
            contact_count: None,
            company_count: None,
        }
    }
}

/// Relations to load alongside projects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectIncludes {
    pub contacts: bool,
    pub activities: bool,
    pub companies: bool,
    pub count_contacts: bool,
    pub count_companies: bool,
}

/// Internal input with generated ID for creating a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectRepoInputWithId {
    pub id: String,
    pub head_id: String,
    pub created_by: String,
    pub name: String,
    pub info: Option<String>,
    pub status: ProjectStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetProjectRepoInput {
    pub project_id: String,
    pub scope: RecordScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListProjectsRepoInput {
    pub scope: RecordScope,
}

/// Partial update: `None` fields keep their stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProjectRepoInput {
    pub project_id: String,
    pub scope: RecordScope,
    pub name: Option<String>,
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteProjectRepoInput {
    pub project_id: String,
    pub scope: RecordScope,
}

/// Repository trait for project storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create_project(&self, input: CreateProjectRepoInputWithId) -> DomainResult<Project>;

    async fn get_project(&self, input: GetProjectRepoInput) -> DomainResult<Option<Project>>;

    /// List projects visible within the scope, newest first
    async fn list_projects(&self, input: ListProjectsRepoInput) -> DomainResult<Vec<Project>>;

    async fn update_project(&self, input: UpdateProjectRepoInput) -> DomainResult<Project>;

    async fn delete_project(&self, input: DeleteProjectRepoInput) -> DomainResult<Project>;

    /// List projects associated with the given owner records
    async fn list_related_projects(
        &self,
        input: ListRelatedRepoInput,
    ) -> DomainResult<Vec<Related<Project>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_status_parse() {
        assert_eq!(
            "IN_PROGRESS".parse::<ProjectStatus>().unwrap(),
            ProjectStatus::InProgress
        );
        assert_eq!(ProjectStatus::OnHold.to_string(), "ON_HOLD");
        assert!(matches!(
            "DONE".parse::<ProjectStatus>(),
            Err(DomainError::InvalidProjectStatus(_))
        ));
    }
}
