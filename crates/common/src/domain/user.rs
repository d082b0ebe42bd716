use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Tenant that scopes every record in the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    pub id: String,
    pub name: String,
}

/// Blanket capabilities granted by a role, per entity and operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCapabilities {
    pub can_create_contact: bool,
    pub can_read_all_contact: bool,
    pub can_edit_all_contact: bool,
    pub can_delete_all_contact: bool,

    pub can_create_company: bool,
    pub can_read_all_company: bool,
    pub can_edit_all_company: bool,
    pub can_delete_all_company: bool,

    pub can_create_project: bool,
    pub can_read_all_project: bool,
    pub can_edit_all_project: bool,
    pub can_delete_all_project: bool,

    pub can_create_activity: bool,
    pub can_read_all_activity: bool,
    pub can_edit_all_activity: bool,
    pub can_delete_all_activity: bool,
    /// Delete activities linked to a contact the user owns
    pub can_delete_connected_activity: bool,
}

impl RoleCapabilities {
    /// Every capability enabled
    pub fn all() -> Self {
        Self {
            can_create_contact: true,
            can_read_all_contact: true,
            can_edit_all_contact: true,
            can_delete_all_contact: true,
            can_create_company: true,
            can_read_all_company: true,
            can_edit_all_company: true,
            can_delete_all_company: true,
            can_create_project: true,
            can_read_all_project: true,
            can_edit_all_project: true,
            can_delete_all_project: true,
            can_create_activity: true,
            can_read_all_activity: true,
            can_edit_all_activity: true,
            can_delete_all_activity: true,
            can_delete_connected_activity: true,
        }
    }
}

/// Role domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub capabilities: RoleCapabilities,
}

/// User domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub head_id: String,
    pub role_id: String,
    pub email: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Authenticated caller: the user together with its role and head
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub head: Head,
    pub role: Role,
}

impl Session {
    pub fn head_id(&self) -> &str {
        &self.head.id
    }

    pub fn capabilities(&self) -> &RoleCapabilities {
        &self.role.capabilities
    }
}

/// Input for loading the session of a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSessionRepoInput {
    pub user_id: String,
}

/// Input for listing users of a head by ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListUsersRepoInput {
    pub head_id: String,
    pub user_ids: Vec<String>,
}

/// Repository trait for user and session lookups
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Load a user joined with its role and head
    async fn get_session(&self, input: GetSessionRepoInput) -> DomainResult<Option<Session>>;

    /// List users of a head by ID
    async fn list_users(&self, input: ListUsersRepoInput) -> DomainResult<Vec<User>>;
}
