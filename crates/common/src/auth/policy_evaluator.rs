use crate::auth::{role_grants, EntityKind, Operation};
use crate::domain::{PolicyGrant, Session};

/// Decides whether a session may perform an operation on a single record,
/// from the role's blanket capabilities and the record's policy rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEvaluator;

impl PolicyEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn is_allowed(
        &self,
        session: &Session,
        entity: EntityKind,
        operation: Operation,
        grants: &[PolicyGrant],
    ) -> bool {
        if role_grants(session.capabilities(), entity, operation) {
            return true;
        }

        grants
            .iter()
            .filter(|grant| grant.user_id == session.user_id)
            .any(|grant| match operation {
                Operation::Read => true,
                Operation::Edit => grant.can_edit,
                Operation::Delete => grant.can_delete,
                Operation::Create => false,
            })
    }

    /// Whether a denied activity delete may still pass through an owned, linked contact
    pub fn allows_connected_activity_delete(&self, session: &Session) -> bool {
        session.capabilities().can_delete_connected_activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Head, Role, RoleCapabilities};

    fn session(caps: RoleCapabilities) -> Session {
        Session {
            user_id: "user-1".to_string(),
            email: "user@example.com".to_string(),
            name: "User".to_string(),
            head: Head {
                id: "head-1".to_string(),
                name: "Acme".to_string(),
            },
            role: Role {
                id: "role-1".to_string(),
                name: "Sales".to_string(),
                capabilities: caps,
            },
        }
    }

    fn grant(user_id: &str, can_edit: bool, can_delete: bool) -> PolicyGrant {
        PolicyGrant {
            user_id: user_id.to_string(),
            record_id: "contact-1".to_string(),
            can_edit,
            can_delete,
        }
    }

    #[test]
    fn test_blanket_capability_allows_without_grants() {
        let session = session(RoleCapabilities {
            can_delete_all_contact: true,
            ..Default::default()
        });
        let evaluator = PolicyEvaluator::new();
        assert!(evaluator.is_allowed(&session, EntityKind::Contact, Operation::Delete, &[]));
    }

    #[test]
    fn test_delete_denied_without_capability_or_grant() {
        let session = session(RoleCapabilities::default());
        let evaluator = PolicyEvaluator::new();
        assert!(!evaluator.is_allowed(&session, EntityKind::Contact, Operation::Delete, &[]));
        assert!(!evaluator.is_allowed(
            &session,
            EntityKind::Contact,
            Operation::Delete,
            &[grant("user-1", true, false)]
        ));
    }

    #[test]
    fn test_policy_row_grants_matching_operation() {
        let session = session(RoleCapabilities::default());
        let evaluator = PolicyEvaluator::new();
        let grants = [grant("user-1", true, false)];

        assert!(evaluator.is_allowed(&session, EntityKind::Contact, Operation::Read, &grants));
        assert!(evaluator.is_allowed(&session, EntityKind::Contact, Operation::Edit, &grants));
        assert!(!evaluator.is_allowed(&session, EntityKind::Contact, Operation::Delete, &grants));
    }

    #[test]
    fn test_other_users_grants_are_ignored() {
        let session = session(RoleCapabilities::default());
        let evaluator = PolicyEvaluator::new();
        let grants = [grant("user-2", true, true)];

        assert!(!evaluator.is_allowed(&session, EntityKind::Contact, Operation::Read, &grants));
        assert!(!evaluator.is_allowed(&session, EntityKind::Contact, Operation::Edit, &grants));
    }

    #[test]
    fn test_create_ignores_grants() {
        let session = session(RoleCapabilities::default());
        let evaluator = PolicyEvaluator::new();
        let grants = [grant("user-1", true, true)];
        assert!(!evaluator.is_allowed(&session, EntityKind::Project, Operation::Create, &grants));
    }
}
