use crate::auth::EntityKind;
use crate::domain::{
    Contact, ContactRepository, CreateContactRepoInputWithId, DeleteContactRepoInput,
    DomainError, DomainResult, GetContactRepoInput, ListContactsRepoInput, ListRelatedRepoInput,
    RecordScope, Related, UpdateContactRepoInput,
};
use crate::postgres::{
    connect_in_tx, grant_creator_policy, junction, scope_sql, PostgresClient, RelatedSelect,
    SqlArgs,
};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

pub(crate) const CONTACT_COLUMNS: &str =
    "c.id, c.head_id, c.user_id, c.name, c.email, c.info, c.mobile, c.created_at, c.updated_at";

pub(crate) fn contact_from_row(row: &tokio_postgres::Row) -> Contact {
    Contact {
        id: row.get("id"),
        head_id: row.get("head_id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        email: row.get("email"),
        info: row.get("info"),
        mobile: row.get("mobile"),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
    }
}

/// Fetch a contact matching the scope inside an open transaction, holding a
/// key-share lock so it cannot be deleted before commit
pub(crate) async fn find_contact_in_tx(
    tx: &deadpool_postgres::Transaction<'_>,
    contact_id: &str,
    scope: &RecordScope,
) -> DomainResult<Option<Contact>> {
    let mut args = SqlArgs::new();
    let id = args.push(contact_id.to_string());
    let scope = scope_sql(scope, EntityKind::Contact, "c", &mut args);
    let query = format!(
        "SELECT {} FROM contacts c WHERE c.id = {} AND {} FOR KEY SHARE",
        CONTACT_COLUMNS, id, scope
    );

    let row = tx
        .query_opt(&query, &args.as_refs())
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

    Ok(row.as_ref().map(contact_from_row))
}

/// PostgreSQL implementation of ContactRepository trait
#[derive(Clone)]
pub struct PostgresContactRepository {
    client: PostgresClient,
}

impl PostgresContactRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {
    #[instrument(skip(self, input), fields(contact_id = %input.id, head_id = %input.head_id))]
    async fn create_contact(&self, input: CreateContactRepoInputWithId) -> DomainResult<Contact> {
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
            "INSERT INTO contacts (id, head_id, user_id, name, email, info, mobile, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
            &[
                &input.id,
                &input.head_id,
                &input.created_by,
                &input.name,
                &input.email,
                &input.info,
                &input.mobile,
                &now,
            ],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        grant_creator_policy(
            &tx,
            EntityKind::Contact,
            &input.head_id,
            &input.created_by,
            &input.id,
        )
        .await?;

        connect_in_tx(
            &tx,
            &input.head_id,
            junction(EntityKind::Contact, EntityKind::Company)?,
            &input.id,
            EntityKind::Company,
            &input.company_ids,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(contact_id = %input.id, companies = input.company_ids.len(), "contact created in database");

        Ok(Contact {
            id: input.id,
            head_id: input.head_id,
            user_id: Some(input.created_by),
            name: input.name,
            email: input.email,
            info: input.info,
            mobile: input.mobile,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    #[instrument(skip(self, input), fields(contact_id = %input.contact_id, head_id = %input.scope.head_id))]
    async fn get_contact(&self, input: GetContactRepoInput) -> DomainResult<Option<Contact>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let id = args.push(input.contact_id.clone());
        let scope = scope_sql(&input.scope, EntityKind::Contact, "c", &mut args);
        let query = format!(
            "SELECT {} FROM contacts c WHERE c.id = {} AND {}",
            CONTACT_COLUMNS, id, scope
        );

        let row = conn
            .query_opt(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(contact_from_row))
    }

    #[instrument(skip(self, input), fields(head_id = %input.scope.head_id))]
    async fn list_contacts(&self, input: ListContactsRepoInput) -> DomainResult<Vec<Contact>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let scope = scope_sql(&input.scope, EntityKind::Contact, "c", &mut args);
        let query = format!(
            "SELECT {} FROM contacts c WHERE {} ORDER BY c.created_at DESC",
            CONTACT_COLUMNS, scope
        );

        let rows = conn
            .query(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(count = rows.len(), "listed contacts");
        Ok(rows.iter().map(contact_from_row).collect())
    }

    #[instrument(skip(self, input), fields(contact_id = %input.contact_id, head_id = %input.scope.head_id))]
    async fn update_contact(&self, input: UpdateContactRepoInput) -> DomainResult<Contact> {
        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let mut args = SqlArgs::new();
        let name = args.push(input.name.clone());
        let email = args.push(input.email.clone());
        let info = args.push(input.info.clone());
        let mobile = args.push(input.mobile.clone());
        let now = args.push(Utc::now());
        let id = args.push(input.contact_id.clone());
        let scope = scope_sql(&input.scope, EntityKind::Contact, "c", &mut args);
        let query = format!(
            "UPDATE contacts AS c
             SET name = {}, email = {}, info = {}, mobile = {}, updated_at = {}
             WHERE c.id = {} AND {}
             RETURNING {}",
            name, email, info, mobile, now, id, scope, CONTACT_COLUMNS
        );

        let row = tx
            .query_opt(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?
            .ok_or_else(|| DomainError::ContactNotFound(input.contact_id.clone()))?;
        let contact = contact_from_row(&row);

        connect_in_tx(
            &tx,
            &input.scope.head_id,
            junction(EntityKind::Contact, EntityKind::Company)?,
            &contact.id,
            EntityKind::Company,
            &input.company_ids,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(contact_id = %contact.id, "contact updated in database");
        Ok(contact)
    }

    #[instrument(skip(self, input), fields(contact_id = %input.contact_id, head_id = %input.scope.head_id))]
    async fn delete_contact(&self, input: DeleteContactRepoInput) -> DomainResult<Contact> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let id = args.push(input.contact_id.clone());
        let scope = scope_sql(&input.scope, EntityKind::Contact, "c", &mut args);
        let query = format!(
            "DELETE FROM contacts AS c WHERE c.id = {} AND {} RETURNING {}",
            id, scope, CONTACT_COLUMNS
        );

        let row = conn
            .query_opt(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => {
                debug!(contact_id = %input.contact_id, "contact deleted from database");
                Ok(contact_from_row(&row))
            }
            None => Err(DomainError::ContactNotFound(input.contact_id)),
        }
    }

    #[instrument(skip(self, input), fields(owner = input.owner_kind.as_str(), owners = input.owner_ids.len()))]
    async fn list_related_contacts(
        &self,
        input: ListRelatedRepoInput,
    ) -> DomainResult<Vec<Related<Contact>>> {
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
        let limit = input.limit_per_owner.map(|limit| args.push(limit));
        let query = RelatedSelect {
            columns: CONTACT_COLUMNS,
            related: EntityKind::Contact,
            junction: junction(input.owner_kind, EntityKind::Contact)?,
            owner_ids: &owner_ids,
            scope: &scope,
            extra: "",
            order_by: "c.created_at DESC",
            limit: limit.as_deref(),
        }
        .to_sql();

        let rows = conn
            .query(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows
            .iter()
            .map(|row| Related {
                owner_id: row.get("owner_id"),
                record: contact_from_row(row),
            })
            .collect())
    }
}
