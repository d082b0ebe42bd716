use crate::auth::EntityKind;
use crate::domain::{
    DomainError, DomainResult, ListPoliciesRepoInput, PolicyGrant, PolicyRepository,
};
use crate::postgres::{entity_table, PostgresClient};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

/// Give the creator of a record full edit and delete rights on it
pub(crate) async fn grant_creator_policy(
    tx: &deadpool_postgres::Transaction<'_>,
    entity: EntityKind,
    head_id: &str,
    user_id: &str,
    record_id: &str,
) -> DomainResult<()> {
    let table = entity_table(entity);
    let query = format!(
        "INSERT INTO {} (id, head_id, user_id, {}, can_edit, can_delete, created_at)
         VALUES ($1, $2, $3, $4, TRUE, TRUE, $5)
         ON CONFLICT (user_id, {}) DO UPDATE SET can_edit = TRUE, can_delete = TRUE",
        table.policy_table, table.policy_column, table.policy_column
    );

    let policy_id = xid::new().to_string();
    let now = Utc::now();
    tx.execute(&query, &[&policy_id, &head_id, &user_id, &record_id, &now])
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

    debug!(entity = entity.as_str(), record_id = %record_id, user_id = %user_id, "creator policy granted");
    Ok(())
}

/// PostgreSQL implementation of PolicyRepository trait
#[derive(Clone)]
pub struct PostgresPolicyRepository {
    client: PostgresClient,
}

impl PostgresPolicyRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PolicyRepository for PostgresPolicyRepository {
    #[instrument(skip(self, input), fields(entity = input.entity.as_str(), user_id = %input.user_id, records = input.record_ids.len()))]
    async fn list_policies(&self, input: ListPoliciesRepoInput) -> DomainResult<Vec<PolicyGrant>> {
        if input.record_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let table = entity_table(input.entity);
        let query = format!(
            "SELECT user_id, {column} AS record_id, can_edit, can_delete
             FROM {table}
             WHERE head_id = $1 AND user_id = $2 AND {column} = ANY($3)",
            column = table.policy_column,
            table = table.policy_table,
        );

        let rows = conn
            .query(&query, &[&input.head_id, &input.user_id, &input.record_ids])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows
            .iter()
            .map(|row| PolicyGrant {
                user_id: row.get("user_id"),
                record_id: row.get("record_id"),
                can_edit: row.get("can_edit"),
                can_delete: row.get("can_delete"),
            })
            .collect())
    }
}
