use std::collections::HashMap;

use crate::auth::{EntityKind, Operation};

/// Row filter applied to every query and mutation: the tenant plus the
/// access rules of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordScope {
    pub head_id: String,
    pub access: AccessFilter,
}

impl RecordScope {
    /// Every row of the head
    pub fn head(head_id: impl Into<String>) -> Self {
        Self {
            head_id: head_id.into(),
            access: AccessFilter::Unrestricted,
        }
    }

    /// True when the filter can never match a row
    pub fn is_empty(&self) -> bool {
        matches!(&self.access, AccessFilter::AnyOf(rules) if rules.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessFilter {
    /// Blanket role capability, only the head filter applies
    Unrestricted,
    /// A row matches when at least one rule matches; an empty list matches nothing
    AnyOf(Vec<AccessRule>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// A policy row for the user grants the operation on the row
    PolicyGrant { user_id: String, operation: Operation },
    /// The row (an activity) is linked to a contact owned by the user
    ConnectedContactOwner { user_id: String },
}

/// A record paired with the ID of the record it was reached from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Related<T> {
    pub owner_id: String,
    pub record: T,
}

/// Input for listing records associated with a set of owner records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRelatedRepoInput {
    pub owner_kind: EntityKind,
    pub owner_ids: Vec<String>,
    /// Scope of the listed (related) records
    pub scope: RecordScope,
    /// Keep only the first N related records per owner
    pub limit_per_owner: Option<i64>,
}

/// Group related records by owner ID, preserving order within each owner
pub fn group_by_owner<T>(related: Vec<Related<T>>) -> HashMap<String, Vec<T>> {
    let mut grouped: HashMap<String, Vec<T>> = HashMap::new();
    for entry in related {
        grouped.entry(entry.owner_id).or_default().push(entry.record);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_scope_is_unrestricted() {
        let scope = RecordScope::head("head-1");
        assert_eq!(scope.access, AccessFilter::Unrestricted);
        assert!(!scope.is_empty());
    }

    #[test]
    fn test_empty_any_of_is_empty() {
        let scope = RecordScope {
            head_id: "head-1".to_string(),
            access: AccessFilter::AnyOf(vec![]),
        };
        assert!(scope.is_empty());
    }

    #[test]
    fn test_group_by_owner_keeps_order() {
        let grouped = group_by_owner(vec![
            Related {
                owner_id: "a".to_string(),
                record: 1,
            },
            Related {
                owner_id: "b".to_string(),
                record: 2,
            },
            Related {
                owner_id: "a".to_string(),
                record: 3,
            },
        ]);
        assert_eq!(grouped["a"], vec![1, 3]);
        assert_eq!(grouped["b"], vec![2]);
    }
}
