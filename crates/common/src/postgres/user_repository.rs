use crate::domain::{
    DomainError, DomainResult, GetSessionRepoInput, Head, ListUsersRepoInput, Role,
    RoleCapabilities, Session, User, UserRepository,
};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// User row for PostgreSQL storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub head_id: String,
    pub role_id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            head_id: row.head_id,
            role_id: row.role_id,
            email: row.email,
            name: row.name,
            created_at: Some(row.created_at),
        }
    }
}

fn capabilities_from_row(row: &tokio_postgres::Row) -> RoleCapabilities {
    RoleCapabilities {
        can_create_contact: row.get("can_create_contact"),
        can_read_all_contact: row.get("can_read_all_contact"),
        can_edit_all_contact: row.get("can_edit_all_contact"),
        can_delete_all_contact: row.get("can_delete_all_contact"),
        can_create_company: row.get("can_create_company"),
        can_read_all_company: row.get("can_read_all_company"),
        can_edit_all_company: row.get("can_edit_all_company"),
        can_delete_all_company: row.get("can_delete_all_company"),
        can_create_project: row.get("can_create_project"),
        can_read_all_project: row.get("can_read_all_project"),
        can_edit_all_project: row.get("can_edit_all_project"),
        can_delete_all_project: row.get("can_delete_all_project"),
        can_create_activity: row.get("can_create_activity"),
        can_read_all_activity: row.get("can_read_all_activity"),
        can_edit_all_activity: row.get("can_edit_all_activity"),
        can_delete_all_activity: row.get("can_delete_all_activity"),
        can_delete_connected_activity: row.get("can_delete_connected_activity"),
    }
}

/// PostgreSQL implementation of UserRepository trait
#[derive(Clone)]
pub struct PostgresUserRepository {
    client: PostgresClient,
}

impl PostgresUserRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    async fn get_session(&self, input: GetSessionRepoInput) -> DomainResult<Option<Session>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        debug!(user_id = %input.user_id, "loading session from database");

        let row = conn
            .query_opt(
                "SELECT u.id, u.email, u.name,
                        h.id AS head_id, h.name AS head_name,
                        r.id AS role_id, r.name AS role_name,
                        r.can_create_contact, r.can_read_all_contact, r.can_edit_all_contact, r.can_delete_all_contact,
                        r.can_create_company, r.can_read_all_company, r.can_edit_all_company, r.can_delete_all_company,
                        r.can_create_project, r.can_read_all_project, r.can_edit_all_project, r.can_delete_all_project,
                        r.can_create_activity, r.can_read_all_activity, r.can_edit_all_activity, r.can_delete_all_activity,
                        r.can_delete_connected_activity
                 FROM users u
                 JOIN heads h ON h.id = u.head_id
                 JOIN roles r ON r.id = u.role_id AND r.head_id = u.head_id
                 WHERE u.id = $1",
                &[&input.user_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.map(|row| Session {
            user_id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
            head: Head {
                id: row.get("head_id"),
                name: row.get("head_name"),
            },
            role: Role {
                id: row.get("role_id"),
                name: row.get("role_name"),
                capabilities: capabilities_from_row(&row),
            },
        }))
    }

    #[instrument(skip(self, input), fields(head_id = %input.head_id, users = input.user_ids.len()))]
    async fn list_users(&self, input: ListUsersRepoInput) -> DomainResult<Vec<User>> {
        if input.user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                "SELECT id, head_id, role_id, email, name, created_at
                 FROM users
                 WHERE head_id = $1 AND id = ANY($2)",
                &[&input.head_id, &input.user_ids],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                UserRow {
                    id: row.get("id"),
                    head_id: row.get("head_id"),
                    role_id: row.get("role_id"),
                    email: row.get("email"),
                    name: row.get("name"),
                    created_at: row.get("created_at"),
                }
                .into()
            })
            .collect())
    }
}
