use tokio_postgres::types::ToSql;

use crate::auth::{EntityKind, Operation};
use crate::domain::{AccessFilter, AccessRule, DomainError, DomainResult, RecordScope};

/// Positional parameters collected while building a dynamic statement
#[derive(Default)]
pub(crate) struct SqlArgs {
    values: Vec<Box<dyn ToSql + Sync + Send>>,
}

impl SqlArgs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a value and return its placeholder
    pub(crate) fn push<T>(&mut self, value: T) -> String
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.values.push(Box::new(value));
        format!("${}", self.values.len())
    }

    pub(crate) fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|value| value.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }
}

/// Storage layout of an entity kind
#[derive(Debug, Clone, Copy)]
pub(crate) struct EntityTable {
    pub table: &'static str,
    pub alias: &'static str,
    pub policy_table: &'static str,
    pub policy_column: &'static str,
}

pub(crate) fn entity_table(entity: EntityKind) -> EntityTable {
    match entity {
        EntityKind::Contact => EntityTable {
            table: "contacts",
            alias: "c",
            policy_table: "contact_policies",
            policy_column: "contact_id",
        },
        EntityKind::Company => EntityTable {
            table: "companies",
            alias: "co",
            policy_table: "company_policies",
            policy_column: "company_id",
        },
        EntityKind::Project => EntityTable {
            table: "projects",
            alias: "pr",
            policy_table: "project_policies",
            policy_column: "project_id",
        },
        EntityKind::Activity => EntityTable {
            table: "activities",
            alias: "a",
            policy_table: "activity_policies",
            policy_column: "activity_id",
        },
    }
}

/// Junction table joining an owner kind to a related kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Junction {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub related_column: &'static str,
}

pub(crate) fn junction(owner: EntityKind, related: EntityKind) -> DomainResult<Junction> {
    use EntityKind::*;

    let (table, owner_column, related_column) = match (owner, related) {
        (Contact, Company) => ("contact_companies", "contact_id", "company_id"),
        (Company, Contact) => ("contact_companies", "company_id", "contact_id"),
        (Contact, Project) => ("contact_projects", "contact_id", "project_id"),
        (Project, Contact) => ("contact_projects", "project_id", "contact_id"),
        (Company, Project) => ("company_projects", "company_id", "project_id"),
        (Project, Company) => ("company_projects", "project_id", "company_id"),
        (Activity, Contact) => ("activity_contacts", "activity_id", "contact_id"),
        (Contact, Activity) => ("activity_contacts", "contact_id", "activity_id"),
        (Activity, Company) => ("activity_companies", "activity_id", "company_id"),
        (Company, Activity) => ("activity_companies", "company_id", "activity_id"),
        (Activity, Project) => ("activity_projects", "activity_id", "project_id"),
        (Project, Activity) => ("activity_projects", "project_id", "activity_id"),
        (owner, related) => {
            return Err(DomainError::UnsupportedAssociation(
                owner.as_str().to_string(),
                related.as_str().to_string(),
            ))
        }
    };

    Ok(Junction {
        table,
        owner_column,
        related_column,
    })
}

fn policy_condition(operation: Operation) -> &'static str {
    match operation {
        Operation::Read | Operation::Create => "",
        Operation::Edit => " AND pol.can_edit",
        Operation::Delete => " AND pol.can_delete",
    }
}

fn rule_sql(rule: &AccessRule, entity: EntityKind, alias: &str, args: &mut SqlArgs) -> String {
    let table = entity_table(entity);
    match rule {
        AccessRule::PolicyGrant { user_id, operation } => format!(
            "EXISTS (SELECT 1 FROM {policy} pol WHERE pol.{column} = {alias}.id AND pol.user_id = {user}{condition})",
            policy = table.policy_table,
            column = table.policy_column,
            alias = alias,
            user = args.push(user_id.clone()),
            condition = policy_condition(*operation),
        ),
        AccessRule::ConnectedContactOwner { user_id } if entity == EntityKind::Activity => format!(
            "EXISTS (SELECT 1 FROM activity_contacts owned_link \
             JOIN contacts owned ON owned.id = owned_link.contact_id \
             WHERE owned_link.activity_id = {alias}.id AND owned.user_id = {user})",
            alias = alias,
            user = args.push(user_id.clone()),
        ),
        AccessRule::ConnectedContactOwner { .. } => "FALSE".to_string(),
    }
}

/// Render a scope as a boolean SQL condition on rows of `entity` aliased as `alias`
pub(crate) fn scope_sql(
    scope: &RecordScope,
    entity: EntityKind,
    alias: &str,
    args: &mut SqlArgs,
) -> String {
    let head = format!("{}.head_id = {}", alias, args.push(scope.head_id.clone()));
    match &scope.access {
        AccessFilter::Unrestricted => head,
        AccessFilter::AnyOf(rules) if rules.is_empty() => format!("{} AND FALSE", head),
        AccessFilter::AnyOf(rules) => {
            let rules: Vec<String> = rules
                .iter()
                .map(|rule| rule_sql(rule, entity, alias, args))
                .collect();
            format!("{} AND ({})", head, rules.join(" OR "))
        }
    }
}

/// SELECT of records related to a set of owners through a junction table.
/// Every row carries the owner as `owner_id`; with a per-owner limit, rows are
/// ranked by `order_by` within each owner.
pub(crate) struct RelatedSelect<'a> {
    pub columns: &'a str,
    pub related: EntityKind,
    pub junction: Junction,
    pub owner_ids: &'a str,
    pub scope: &'a str,
    pub extra: &'a str,
    pub order_by: &'a str,
    pub limit: Option<&'a str>,
}

impl RelatedSelect<'_> {
    pub(crate) fn to_sql(&self) -> String {
        let table = entity_table(self.related);
        let rank = match self.limit {
            Some(_) => format!(
                ", ROW_NUMBER() OVER (PARTITION BY j.{} ORDER BY {}) AS owner_rank",
                self.junction.owner_column, self.order_by
            ),
            None => String::new(),
        };
        let base = format!(
            "SELECT j.{owner} AS owner_id, {columns}{rank} \
             FROM {junction} j JOIN {table} {alias} ON {alias}.id = j.{related_column} \
             WHERE j.{owner} = ANY({owner_ids}) AND {scope}{extra}",
            owner = self.junction.owner_column,
            columns = self.columns,
            rank = rank,
            junction = self.junction.table,
            table = table.table,
            alias = table.alias,
            related_column = self.junction.related_column,
            owner_ids = self.owner_ids,
            scope = self.scope,
            extra = self.extra,
        );

        match self.limit {
            Some(limit) => format!(
                "SELECT * FROM ({}) ranked WHERE ranked.owner_rank <= {} ORDER BY ranked.owner_id, ranked.owner_rank",
                base, limit
            ),
            None => format!("{} ORDER BY {}", base, self.order_by),
        }
    }
}
