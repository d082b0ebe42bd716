use crate::auth::EntityKind;
use crate::domain::{
    Activity, ActivityOwnerCheckRepoInput, ActivityRepository, ActivityType,
    CreateActivityRepoInputWithId, DeleteActivityRepoInput, DomainError, DomainResult,
    GetActivityRepoInput, ListActivitiesRepoInput, ListRelatedActivitiesRepoInput, Related,
};
use crate::postgres::{
    connect_in_tx, grant_creator_policy, junction, scope_sql, PostgresClient, RelatedSelect,
    SqlArgs,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

pub(crate) const ACTIVITY_COLUMNS: &str =
    "a.id, a.head_id, a.description, a.activity_type, a.date, a.created_at, a.updated_at";

/// Activity row for PostgreSQL storage; the type is stored as text
#[derive(Debug, Clone)]
pub struct ActivityRow {
    pub id: String,
    pub head_id: String,
    pub description: Option<String>,
    pub activity_type: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for Activity {
    type Error = DomainError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(Activity {
            id: row.id,
            head_id: row.head_id,
            description: row.description,
            activity_type: row.activity_type.parse::<ActivityType>()?,
            date: row.date,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

pub(crate) fn activity_from_row(row: &tokio_postgres::Row) -> DomainResult<Activity> {
    ActivityRow {
        id: row.get("id"),
        head_id: row.get("head_id"),
        description: row.get("description"),
        activity_type: row.get("activity_type"),
        date: row.get("date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
    .try_into()
}

/// PostgreSQL implementation of ActivityRepository trait
#[derive(Clone)]
pub struct PostgresActivityRepository {
    client: PostgresClient,
}

impl PostgresActivityRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ActivityRepository for PostgresActivityRepository {
    #[instrument(skip(self, input), fields(activity_id = %input.id, head_id = %input.head_id))]
    async fn create_activity(
        &self,
        input: CreateActivityRepoInputWithId,
    ) -> DomainResult<Activity> {
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
            "INSERT INTO activities (id, head_id, description, activity_type, date, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
            &[
                &input.id,
                &input.head_id,
                &input.description,
                &input.activity_type.as_str(),
                &input.date,
                &now,
            ],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        grant_creator_policy(
            &tx,
            EntityKind::Activity,
            &input.head_id,
            &input.created_by,
            &input.id,
        )
        .await?;

        for (related, ids) in [
            (EntityKind::Contact, &input.contact_ids),
            (EntityKind::Company, &input.company_ids),
            (EntityKind::Project, &input.project_ids),
        ] {
            connect_in_tx(
                &tx,
                &input.head_id,
                junction(EntityKind::Activity, related)?,
                &input.id,
                related,
                ids,
            )
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(activity_id = %input.id, activity_type = %input.activity_type, "activity created in database");

        Ok(Activity {
            id: input.id,
            head_id: input.head_id,
            description: input.description,
            activity_type: input.activity_type,
            date: input.date,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    #[instrument(skip(self, input), fields(activity_id = %input.activity_id, head_id = %input.scope.head_id))]
    async fn get_activity(&self, input: GetActivityRepoInput) -> DomainResult<Option<Activity>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let id = args.push(input.activity_id.clone());
        let scope = scope_sql(&input.scope, EntityKind::Activity, "a", &mut args);
        let query = format!(
            "SELECT {} FROM activities a WHERE a.id = {} AND {}",
            ACTIVITY_COLUMNS, id, scope
        );

        let row = conn
            .query_opt(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        row.as_ref().map(activity_from_row).transpose()
    }

    #[instrument(skip(self, input), fields(head_id = %input.scope.head_id))]
    async fn list_activities(&self, input: ListActivitiesRepoInput) -> DomainResult<Vec<Activity>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let scope = scope_sql(&input.scope, EntityKind::Activity, "a", &mut args);
        let query = format!(
            "SELECT {} FROM activities a WHERE {} ORDER BY a.date DESC",
            ACTIVITY_COLUMNS, scope
        );

        let rows = conn
            .query(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        rows.iter().map(activity_from_row).collect()
    }

    #[instrument(skip(self, input), fields(activity_id = %input.activity_id, head_id = %input.scope.head_id))]
    async fn delete_activity(&self, input: DeleteActivityRepoInput) -> DomainResult<Activity> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let id = args.push(input.activity_id.clone());
        let scope = scope_sql(&input.scope, EntityKind::Activity, "a", &mut args);
        let query = format!(
            "DELETE FROM activities AS a WHERE a.id = {} AND {} RETURNING {}",
            id, scope, ACTIVITY_COLUMNS
        );

        let row = conn
            .query_opt(&query, &args.as_refs())
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => {
                debug!(activity_id = %input.activity_id, "activity deleted from database");
                activity_from_row(&row)
            }
            None => Err(DomainError::ActivityNotFound(input.activity_id)),
        }
    }

    #[instrument(skip(self, input), fields(owner = input.related.owner_kind.as_str(), owners = input.related.owner_ids.len()))]
    async fn list_related_activities(
        &self,
        input: ListRelatedActivitiesRepoInput,
    ) -> DomainResult<Vec<Related<Activity>>> {
        let related = input.related;
        if related.owner_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let mut args = SqlArgs::new();
        let owner_ids = args.push(related.owner_ids.clone());
        let scope = scope_sql(&related.scope, EntityKind::Activity, "a", &mut args);

        let mut extra = String::new();
        if let Some(exclusion) = &input.exclusion {
            let contact = args.push(exclusion.contact_id.clone());
            extra.push_str(&format!(
                " AND NOT EXISTS (SELECT 1 FROM activity_contacts ex \
                 WHERE ex.activity_id = a.id AND ex.contact_id = {})",
                contact
            ));
            if exclusion.include_contact_projects {
                extra.push_str(&format!(
                    " AND NOT EXISTS (SELECT 1 FROM activity_projects exp \
                     JOIN contact_projects cp ON cp.project_id = exp.project_id \
                     WHERE exp.activity_id = a.id AND cp.contact_id = {})",
                    contact
                ));
            }
        }

        let limit = related.limit_per_owner.map(|limit| args.push(limit));
        let query = RelatedSelect {
            columns: ACTIVITY_COLUMNS,
            related: EntityKind::Activity,
            junction: junction(related.owner_kind, EntityKind::Activity)?,
            owner_ids: &owner_ids,
            scope: &scope,
            extra: &extra,
            order_by: "a.date DESC",
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
                    record: activity_from_row(row)?,
                })
            })
            .collect()
    }

    #[instrument(skip(self, input), fields(activity_id = %input.activity_id, user_id = %input.user_id))]
    async fn is_linked_to_owned_contact(
        &self,
        input: ActivityOwnerCheckRepoInput,
    ) -> DomainResult<bool> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_one(
                "SELECT EXISTS (
                     SELECT 1 FROM activity_contacts ac
                     JOIN contacts c ON c.id = ac.contact_id
                     WHERE ac.activity_id = $1 AND c.head_id = $2 AND c.user_id = $3
                 ) AS linked",
                &[&input.activity_id, &input.head_id, &input.user_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.get("linked"))
    }
}
