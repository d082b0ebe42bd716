use std::collections::{BTreeSet, HashSet};

use crate::auth::EntityKind;
use crate::domain::{
    AssociationCount, AssociationRepoInput, AssociationRepository, CountAssociationsRepoInput,
    DomainError, DomainResult, RecordScope,
};
use crate::postgres::{entity_table, junction, scope_sql, Junction, PostgresClient, SqlArgs};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Key-share lock the owner row if it matches the scope, or fail with not-found.
/// The lock only blocks deletes, so concurrent connects from either side of a
/// junction do not wait on each other.
pub(crate) async fn lock_owner_in_tx(
    tx: &deadpool_postgres::Transaction<'_>,
    entity: EntityKind,
    owner_id: &str,
    scope: &RecordScope,
) -> DomainResult<()> {
    let table = entity_table(entity);
    let mut args = SqlArgs::new();
    let id = args.push(owner_id.to_string());
    let scope = scope_sql(scope, entity, table.alias, &mut args);
    let query = format!(
        "SELECT {alias}.id FROM {table} {alias} WHERE {alias}.id = {id} AND {scope} FOR KEY SHARE",
        alias = table.alias,
        table = table.table,
        id = id,
        scope = scope,
    );

    let row = tx
        .query_opt(&query, &args.as_refs())
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

    match row {
        Some(_) => Ok(()),
        None => Err(DomainError::not_found(entity, owner_id)),
    }
}

/// Connect related records to an owner within an open transaction.
/// Every related ID must exist in the head; otherwise nothing is inserted.
pub(crate) async fn connect_in_tx(
    tx: &deadpool_postgres::Transaction<'_>,
    head_id: &str,
    junction: Junction,
    owner_id: &str,
    related: EntityKind,
    related_ids: &[String],
) -> DomainResult<()> {
    if related_ids.is_empty() {
        return Ok(());
    }

    // Sorted so concurrent inserts into the same junction take row locks in one order
    let wanted: Vec<String> = related_ids
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let table = entity_table(related);
    let query = format!(
        "SELECT id FROM {} WHERE head_id = $1 AND id = ANY($2)",
        table.table
    );
    let rows = tx
        .query(&query, &[&head_id, &wanted])
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

    let found: HashSet<String> = rows.iter().map(|row| row.get("id")).collect();
    if let Some(missing) = related_ids.iter().find(|id| !found.contains(*id)) {
        return Err(DomainError::not_found(related, missing.clone()));
    }

    let insert = format!(
        "INSERT INTO {} ({}, {}) SELECT $1, UNNEST($2::text[]) ON CONFLICT DO NOTHING",
        junction.table, junction.owner_column, junction.related_column
    );
    let inserted = tx
        .execute(&insert, &[&owner_id, &wanted])
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

    debug!(table = junction.table, owner_id = %owner_id, inserted, "associations connected");
    Ok(())
}

/// PostgreSQL implementation of AssociationRepository trait
#[derive(Clone)]
pub struct PostgresAssociationRepository {
    client: PostgresClient,
}

impl PostgresAssociationRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssociationRepository for PostgresAssociationRepository {
    #[instrument(skip(self, input), fields(owner = input.owner_kind.as_str(), owner_id = %input.owner_id, related = input.related_kind.as_str()))]
    async fn connect(&self, input: AssociationRepoInput) -> DomainResult<()> {
        let junction = junction(input.owner_kind, input.related_kind)?;

        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        lock_owner_in_tx(&tx, input.owner_kind, &input.owner_id, &input.owner_scope).await?;
        connect_in_tx(
            &tx,
            &input.owner_scope.head_id,
            junction,
            &input.owner_id,
            input.related_kind,
            &input.related_ids,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(())
    }

    #[instrument(skip(self, input), fields(owner = input.owner_kind.as_str(), owner_id = %input.owner_id, related = input.related_kind.as_str()))]
    async fn disconnect(&self, input: AssociationRepoInput) -> DomainResult<()> {
        let junction = junction(input.owner_kind, input.related_kind)?;

        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        lock_owner_in_tx(&tx, input.owner_kind, &input.owner_id, &input.owner_scope).await?;

        let query = format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = ANY($2)",
            junction.table, junction.owner_column, junction.related_column
        );
        let removed = tx
            .execute(&query, &[&input.owner_id, &input.related_ids])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(table = junction.table, removed, "associations disconnected");
        Ok(())
    }

    #[instrument(skip(self, input), fields(owner = input.owner_kind.as_str(), related = input.related_kind.as_str(), owners = input.owner_ids.len()))]
    async fn count_associations(
        &self,
        input: CountAssociationsRepoInput,
    ) -> DomainResult<Vec<AssociationCount>> {
        if input.owner_ids.is_empty() {
            return Ok(Vec::new());
        }

        let junction = junction(input.owner_kind, input.related_kind)?;
        let owner = entity_table(input.owner_kind);

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let query = format!(
            "SELECT j.{owner_column} AS owner_id, COUNT(*) AS count
             FROM {junction} j JOIN {owner_table} o ON o.id = j.{owner_column}
             WHERE o.head_id = $1 AND j.{owner_column} = ANY($2)
             GROUP BY j.{owner_column}",
            owner_column = junction.owner_column,
            junction = junction.table,
            owner_table = owner.table,
        );

        let rows = conn
            .query(&query, &[&input.head_id, &input.owner_ids])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows
            .iter()
            .map(|row| AssociationCount {
                owner_id: row.get("owner_id"),
                count: row.get("count"),
            })
            .collect())
    }
}
