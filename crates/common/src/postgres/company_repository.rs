use crate::auth::EntityKind;
use crate::domain::{
    Company, CompanyRepository, CreateCompanyRepoInputWithId, DeleteCompanyRepoInput,
    DomainError, DomainResult, GetCompanyRepoInput, ListCompaniesRepoInput, ListRelatedRepoInput,
    Related, UpdateCompanyRepoInput,
};
use crate::postgres::{
    grant_creator_policy, junction, scope_sql, PostgresClient, RelatedSelect, SqlArgs,
};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

pub(crate) const COMPANY_COLUMNS: &str =
    "co.id, co.head_id, co.name, co.info, co.created_at, co.updated_at";

pub(crate) fn company_from_row(row: &tokio_postgres::Row) -> Company {
    Company {
        id: row.get("id"),
        head_id: row.get("head_id"),
        name: row.get("name"),
        info: row.get("info"),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
    }
}

/// PostgreSQL implementation of CompanyRepository trait
#[derive(Clone)]
pub struct PostgresCompanyRepository {
    client: PostgresClient,
}

impl PostgresCompanyRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompanyRepository for PostgresCompanyRepository {
    #[instrument(skip(self, input), fields(company_id = %input.id, head_id = %input.head_id))]
    async fn create_company(&self, input: CreateCompanyRepoInputWithId) -> DomainResult<Company> {
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
            "INSERT INTO companies (id, head_id, name, info, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)",
            &[&input.id, &input.head_id, &input.name, &input.info, &now],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        grant_creator_policy(
            &tx,
            EntityKind::Company,
            &input.head_id,
            &input.created_by,
            &input.id,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(company_id = %input.id, "company created in database");

        Ok(Company {
            id: input.id,
            head_id: input.head_id,
            name: input.name,
            info: input.info,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    #[instrument(skip(self, input), fields(company_id = %input.company_id, head_id = %input.scope.head_id))]
    async fn get_company(&self, input: GetCompanyRepoInput) -> DomainResult<Option<Company>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let id = args.push(input.company_id.clone());
        let scope = scope_sql(&input.scope, EntityKind::Company, "co", &mut args);
        let query = format!(
            "SELECT {} FROM companies co WHERE co.id = {} AND {}",
            COMPANY_COLUMNS, id, scope
        );

        let row = conn
            .query_opt(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.as_ref().map(company_from_row))
    }

    #[instrument(skip(self, input), fields(head_id = %input.scope.head_id))]
    async fn list_companies(&self, input: ListCompaniesRepoInput) -> DomainResult<Vec<Company>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let scope = scope_sql(&input.scope, EntityKind::Company, "co", &mut args);
        let query = format!(
            "SELECT {} FROM companies co WHERE {} ORDER BY co.created_at DESC",
            COMPANY_COLUMNS, scope
        );

        let rows = conn
            .query(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows.iter().map(company_from_row).collect())
    }

    #[instrument(skip(self, input), fields(company_id = %input.company_id, head_id = %input.scope.head_id))]
    async fn update_company(&self, input: UpdateCompanyRepoInput) -> DomainResult<Company> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let name = args.push(input.name.clone());
        let keep_info = args.push(input.info.is_none());
        let info = args.push(input.info.clone().flatten());
        let now = args.push(Utc::now());
        let id = args.push(input.company_id.clone());
        let scope = scope_sql(&input.scope, EntityKind::Company, "co", &mut args);
        let query = format!(
            "UPDATE companies AS co
             SET name = COALESCE({name}, co.name),
                 info = CASE WHEN {keep_info} THEN co.info ELSE {info} END,
                 updated_at = {now}
             WHERE co.id = {id} AND {scope}
             RETURNING {columns}",
            name = name,
            keep_info = keep_info,
            info = info,
            now = now,
            id = id,
            scope = scope,
            columns = COMPANY_COLUMNS,
        );

        let row = conn
            .query_opt(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => {
                debug!(company_id = %input.company_id, "company updated in database");
                Ok(company_from_row(&row))
            }
            None => Err(DomainError::CompanyNotFound(input.company_id)),
        }
    }

    #[instrument(skip(self, input), fields(company_id = %input.company_id, head_id = %input.scope.head_id))]
    async fn delete_company(&self, input: DeleteCompanyRepoInput) -> DomainResult<Company> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let id = args.push(input.company_id.clone());
        let scope = scope_sql(&input.scope, EntityKind::Company, "co", &mut args);
        let query = format!(
            "DELETE FROM companies AS co WHERE co.id = {} AND {} RETURNING {}",
            id, scope, COMPANY_COLUMNS
        );

        let row = conn
            .query_opt(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => {
                debug!(company_id = %input.company_id, "company deleted from database");
                Ok(company_from_row(&row))
            }
            None => Err(DomainError::CompanyNotFound(input.company_id)),
        }
    }

    #[instrument(skip(self, input), fields(owner = input.owner_kind.as_str(), owners = input.owner_ids.len()))]
    async fn list_related_companies(
        &self,
        input: ListRelatedRepoInput,
    ) -> DomainResult<Vec<Related<Company>>> {
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
        let scope = scope_sql(&input.scope, EntityKind::Company, "co", &mut args);
        let limit = input.limit_per_owner.map(|limit| args.push(limit));
        let query = RelatedSelect {
            columns: COMPANY_COLUMNS,
            related: EntityKind::Company,
            junction: junction(input.owner_kind, EntityKind::Company)?,
            owner_ids: &owner_ids,
            scope: &scope,
            extra: "",
            order_by: "co.created_at DESC",
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
                record: company_from_row(row),
            })
            .collect())
    }
}
