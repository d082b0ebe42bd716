use std::fmt;
use std::str::FromStr;

use crate::domain::result::{DomainError, DomainResult};
use crate::domain::{ListRelatedRepoInput, RecordScope, Related};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Kind of interaction an activity records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivityType {
    #[default]
    Note,
    Call,
    Email,
    Meeting,
    Task,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Note => "NOTE",
            ActivityType::Call => "CALL",
            ActivityType::Email => "EMAIL",
            ActivityType::Meeting => "MEETING",
            ActivityType::Task => "TASK",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOTE" => Ok(ActivityType::Note),
            "CALL" => Ok(ActivityType::Call),
            "EMAIL" => Ok(ActivityType::Email),
            "MEETING" => Ok(ActivityType::Meeting),
            "TASK" => Ok(ActivityType::Task),
            other => Err(DomainError::InvalidActivityType(other.to_string())),
        }
    }
}

/// Activity domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: String,
    pub head_id: String,
    pub description: Option<String>,
    pub activity_type: ActivityType,
    pub date: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Internal input with generated ID for creating an activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateActivityRepoInputWithId {
    pub id: String,
    pub head_id: String,
    pub created_by: String,
    pub description: Option<String>,
    pub activity_type: ActivityType,
    pub date: DateTime<Utc>,
    pub contact_ids: Vec<String>,
    pub company_ids: Vec<String>,
    pub project_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetActivityRepoInput {
    pub activity_id: String,
    pub scope: RecordScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListActivitiesRepoInput {
    pub scope: RecordScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteActivityRepoInput {
    pub activity_id: String,
    pub scope: RecordScope,
}

/// Drop activities already shown on a contact from another owner's list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityExclusion {
    /// Exclude activities linked to this contact
    pub contact_id: String,
    /// Also exclude activities linked to projects this contact belongs to
    pub include_contact_projects: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRelatedActivitiesRepoInput {
    pub related: ListRelatedRepoInput,
    pub exclusion: Option<ActivityExclusion>,
}

/// Input for checking whether an activity is linked to a contact owned by a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityOwnerCheckRepoInput {
    pub activity_id: String,
    pub head_id: String,
    pub user_id: String,
}

/// Repository trait for activity storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Create an activity and link it to contacts, companies and projects atomically
    async fn create_activity(&self, input: CreateActivityRepoInputWithId)
        -> DomainResult<Activity>;

    async fn get_activity(&self, input: GetActivityRepoInput) -> DomainResult<Option<Activity>>;

    /// List activities visible within the scope, latest date first
    async fn list_activities(&self, input: ListActivitiesRepoInput) -> DomainResult<Vec<Activity>>;

    async fn delete_activity(&self, input: DeleteActivityRepoInput) -> DomainResult<Activity>;

    /// List activities linked to the given owner records, latest date first
    async fn list_related_activities(
        &self,
        input: ListRelatedActivitiesRepoInput,
    ) -> DomainResult<Vec<Related<Activity>>>;

    async fn is_linked_to_owned_contact(
        &self,
        input: ActivityOwnerCheckRepoInput,
    ) -> DomainResult<bool>;
}
