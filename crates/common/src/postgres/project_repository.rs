use crate::auth::EntityKind;
use crate::domain::{
    CreateProjectRepoInputWithId, DeleteProjectRepoInput, DomainError, DomainResult,
    GetProjectRepoInput, ListProjectsRepoInput, ListRelatedRepoInput, Project, ProjectRepository,
    ProjectStatus, Related, UpdateProjectRepoInput,
};
use crate::postgres::{
    grant_creator_policy, junction, scope_sql, PostgresClient, RelatedSelect, SqlArgs,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

pub(crate) const PROJECT_COLUMNS: &str =
    "pr.id, pr.head_id, pr.name, pr.info, pr.status, pr.created_at, pr.updated_at";

/// Project row for PostgreSQL storage; status is stored as text
#[derive(Debug, Clone)]
pub struct ProjectRow {
    pub id: String,
    pub head_id: String,
    pub name: String,
    pub info: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = DomainError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: row.id,
            head_id: row.head_id,
            name: row.name,
            info: row.info,
            status: row.status.parse::<ProjectStatus>()?,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

pub(crate) fn project_from_row(row: &tokio_postgres::Row) -> DomainResult<Project> {
    ProjectRow {
        id: row.get("id"),
        head_id: row.get("head_id"),
        name: row.get("name"),
        info: row.get("info"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
    .try_into()
}

/// PostgreSQL implementation of ProjectRepository trait
#[derive(Clone)]
pub struct PostgresProjectRepository {
    client: PostgresClient,
}

impl PostgresProjectRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    #[instrument(skip(self, input), fields(project_id = %input.id, head_id = %input.head_id))]
    async fn create_project(&self, input: CreateProjectRepoInputWithId) -> DomainResult<Project> {
        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let now = Utc::now();

        tx.execute(
            "INSERT INTO projects (id, head_id, name, info, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
            &[
                &input.id,
                &input.head_id,
                &input.name,
                &input.info,
                &input.status.as_str(),
                &now,
            ],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        grant_creator_policy(
            &tx,
            EntityKind::Project,
            &input.head_id,
            &input.created_by,
            &input.id,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(project_id = %input.id, status = %input.status, "project created in database");

        Ok(Project {
            id: input.id,
            head_id: input.head_id,
            name: input.name,
            info: input.info,
            status: input.status,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    #[instrument(skip(self, input), fields(project_id = %input.project_id, head_id = %input.scope.head_id))]
    async fn get_project(&self, input: GetProjectRepoInput) -> DomainResult<Option<Project>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let id = args.push(input.project_id.clone());
        let scope = scope_sql(&input.scope, EntityKind::Project, "pr", &mut args);
        let query = format!(
            "SELECT {} FROM projects pr WHERE pr.id = {} AND {}",
            PROJECT_COLUMNS, id, scope
        );

        let row = conn
            .query_opt(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        row.as_ref().map(project_from_row).transpose()
    }

    #[instrument(skip(self, input), fields(head_id = %input.scope.head_id))]
    async fn list_projects(&self, input: ListProjectsRepoInput) -> DomainResult<Vec<Project>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let scope = scope_sql(&input.scope, EntityKind::Project, "pr", &mut args);
        let query = format!(
            "SELECT {} FROM projects pr WHERE {} ORDER BY pr.created_at DESC",
            PROJECT_COLUMNS, scope
        );

        let rows = conn
            .query(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        rows.iter().map(project_from_row).collect()
    }

    #[instrument(skip(self, input), fields(project_id = %input.project_id, head_id = %input.scope.head_id))]
    async fn update_project(&self, input: UpdateProjectRepoInput) -> DomainResult<Project> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let name = args.push(input.name.clone());
        let status = args.push(input.status.map(|status| status.as_str().to_string()));
        let now = args.push(Utc::now());
        let id = args.push(input.project_id.clone());
        let scope = scope_sql(&input.scope, EntityKind::Project, "pr", &mut args);
        let query = format!(
            "UPDATE projects AS pr
             SET name = COALESCE({name}, pr.name), status = COALESCE({status}, pr.status), updated_at = {now}
             WHERE pr.id = {id} AND {scope}
             RETURNING {columns}",
            name = name,
            status = status,
            now = now,
            id = id,
            scope = scope,
            columns = PROJECT_COLUMNS,
        );

        let row = conn
            .query_opt(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => {
                debug!(project_id = %input.project_id, "project updated in database");
                project_from_row(&row)
            }
            None => Err(DomainError::ProjectNotFound(input.project_id)),
        }
    }

    #[instrument(skip(self, input), fields(project_id = %input.project_id, head_id = %input.scope.head_id))]
    async fn delete_project(&self, input: DeleteProjectRepoInput) -> DomainResult<Project> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let id = args.push(input.project_id.clone());
        let scope = scope_sql(&input.scope, EntityKind::Project, "pr", &mut args);
        let query = format!(
            "DELETE FROM projects AS pr WHERE pr.id = {} AND {} RETURNING {}",
            id, scope, PROJECT_COLUMNS
        );

        let row = conn
            .query_opt(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => {
                debug!(project_id = %input.project_id, "project deleted from database");
                project_from_row(&row)
            }
            None => Err(DomainError::ProjectNotFound(input.project_id)),
        }
    }

    #[instrument(skip(self, input), fields(owner = input.owner_kind.as_str(), owners = input.owner_ids.len()))]
    async fn list_related_projects(
        &self,
        input: ListRelatedRepoInput,
    ) -> DomainResult<Vec<Related<Project>>> {
        if input.owner_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let owner_ids = args.push(input.owner_ids.clone());
        let scope = scope_sql(&input.scope, EntityKind::Project, "pr", &mut args);
        let limit = input.limit_per_owner.map(|limit| args.push(limit));
        let query = RelatedSelect {
            columns: PROJECT_COLUMNS,
            related: EntityKind::Project,
            junction: junction(input.owner_kind, EntityKind::Project)?,
            owner_ids: &owner_ids,
            scope: &scope,
            extra: "",
            order_by: "pr.created_at DESC",
            limit: limit.as_deref(),
        }
        .to_sql();

        let rows = conn
            .query(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        rows.iter()
            .map(|row| {
                Ok(Related {
                    owner_id: row.get("owner_id"),
                    record: project_from_row(row)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_row_rejects_unknown_status() {
        let row = ProjectRow {
            id: "p1".to_string(),
            head_id: "h1".to_string(),
            name: "Launch".to_string(),
            info: None,
            status: "ARCHIVED".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(
            Project::try_from(row),
            Err(DomainError::InvalidProjectStatus(_))
        ));
    }
}
