use crate::auth::EntityKind;
use crate::domain::{
    Contact, ContactLinkRepoInput, ContactRelation, ContactRelationRepository, DomainError,
    DomainResult, ListRelatedRepoInput, RecordScope, RelationSide,
};
use crate::postgres::{
    contact_from_row, find_contact_in_tx, scope_sql, PostgresClient, SqlArgs, CONTACT_COLUMNS,
};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

/// (from, to) edges a link operation touches, sorted so that concurrent
/// requests on the same pair lock rows in the same order
fn directed_edges(input: &ContactLinkRepoInput) -> Vec<(String, String)> {
    let mut edges = Vec::with_capacity(2);
    if input.direction.includes_outgoing() {
        edges.push((input.source_id.clone(), input.target_id.clone()));
    }
    if input.direction.includes_incoming() {
        edges.push((input.target_id.clone(), input.source_id.clone()));
    }
    edges.sort();
    edges
}

/// PostgreSQL implementation of ContactRelationRepository trait
#[derive(Clone)]
pub struct PostgresContactRelationRepository {
    client: PostgresClient,
}

impl PostgresContactRelationRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContactRelationRepository for PostgresContactRelationRepository {
    #[instrument(skip(self, input), fields(source_id = %input.source_id, target_id = %input.target_id, direction = ?input.direction))]
    async fn add_links(&self, input: ContactLinkRepoInput) -> DomainResult<Contact> {
        if input.source_id == input.target_id {
            return Err(DomainError::SelfLink(input.source_id));
        }

        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let source = find_contact_in_tx(&tx, &input.source_id, &input.source_scope)
            .await?
            .ok_or_else(|| DomainError::ContactNotFound(input.source_id.clone()))?;

        let target_scope = input
            .target_scope
            .clone()
            .unwrap_or_else(|| RecordScope::head(input.source_scope.head_id.clone()));
        find_contact_in_tx(&tx, &input.target_id, &target_scope)
            .await?
            .ok_or_else(|| DomainError::ContactNotFound(input.target_id.clone()))?;

        let now = Utc::now();
        for (from, to) in directed_edges(&input) {
            tx.execute(
                "INSERT INTO contact_relations (head_id, from_contact_id, to_contact_id, created_at)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (from_contact_id, to_contact_id) DO NOTHING",
                &[&source.head_id, &from, &to, &now],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(source_id = %input.source_id, target_id = %input.target_id, "contact links added");
        Ok(source)
    }

    #[instrument(skip(self, input), fields(source_id = %input.source_id, target_id = %input.target_id, direction = ?input.direction))]
    async fn remove_links(&self, input: ContactLinkRepoInput) -> DomainResult<Contact> {
        if input.source_id == input.target_id {
            return Err(DomainError::SelfLink(input.source_id));
        }

        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let source = find_contact_in_tx(&tx, &input.source_id, &input.source_scope)
            .await?
            .ok_or_else(|| DomainError::ContactNotFound(input.source_id.clone()))?;

        let mut removed = 0;
        for (from, to) in directed_edges(&input) {
            removed += tx
                .execute(
                    "DELETE FROM contact_relations
                     WHERE head_id = $1 AND from_contact_id = $2 AND to_contact_id = $3",
                    &[&source.head_id, &from, &to],
                )
                .await
                .map_err(|e| DomainError::RepositoryError(e.into()))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(source_id = %input.source_id, removed, "contact links removed");
        Ok(source)
    }

    #[instrument(skip(self, input), fields(owners = input.owner_ids.len()))]
    async fn list_relations(
        &self,
        input: ListRelatedRepoInput,
    ) -> DomainResult<Vec<ContactRelation>> {
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
        let scope = scope_sql(&input.scope, EntityKind::Contact, "c", &mut args);
        let query = format!(
            "SELECT r.from_contact_id AS owner_id, 'outgoing' AS side, {columns}
             FROM contact_relations r JOIN contacts c ON c.id = r.to_contact_id
             WHERE r.from_contact_id = ANY({owners}) AND {scope}
             UNION ALL
             SELECT r.to_contact_id AS owner_id, 'incoming' AS side, {columns}
             FROM contact_relations r JOIN contacts c ON c.id = r.from_contact_id
             WHERE r.to_contact_id = ANY({owners}) AND {scope}
             ORDER BY created_at DESC",
            columns = CONTACT_COLUMNS,
            owners = owner_ids,
            scope = scope,
        );

        let rows = conn
            .query(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows
            .iter()
            .map(|row| {
                let side: String = row.get("side");
                ContactRelation {
                    contact_id: row.get("owner_id"),
                    side: if side == "outgoing" {
                        RelationSide::Outgoing
                    } else {
                        RelationSide::Incoming
                    },
                    contact: contact_from_row(row),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LinkDirection;

    fn input(direction: LinkDirection) -> ContactLinkRepoInput {
        ContactLinkRepoInput {
            source_id: "a".to_string(),
            target_id: "b".to_string(),
            direction,
            source_scope: RecordScope::head("h1"),
            target_scope: None,
        }
    }

    #[test]
    fn test_outgoing_mode_touches_source_to_target_only() {
        assert_eq!(
            directed_edges(&input(LinkDirection::Outgoing)),
            vec![("a".to_string(), "b".to_string())]
        );
    }

    #[test]
    fn test_incoming_mode_touches_target_to_source_only() {
        assert_eq!(
            directed_edges(&input(LinkDirection::Incoming)),
            vec![("b".to_string(), "a".to_string())]
        );
    }

    #[test]
    fn test_both_mode_touches_both_edges() {
        assert_eq!(directed_edges(&input(LinkDirection::Both)).len(), 2);
    }

    #[test]
    fn test_both_mode_edges_are_ordered_regardless_of_source() {
        let forward = directed_edges(&input(LinkDirection::Both));
        let reverse = directed_edges(&ContactLinkRepoInput {
            source_id: "b".to_string(),
            target_id: "a".to_string(),
            ..input(LinkDirection::Both)
        });

        assert_eq!(forward, reverse);
        assert_eq!(forward[0], ("a".to_string(), "b".to_string()));
    }
}
