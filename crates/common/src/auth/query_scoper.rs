use crate::auth::{role_grants, EntityKind, Operation};
use crate::domain::{AccessFilter, AccessRule, RecordScope, Session};

/// Turns a session and an operation into the row filter every query applies
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryScoper;

impl QueryScoper {
    pub fn new() -> Self {
        Self
    }

    pub fn scope(&self, session: &Session, entity: EntityKind, operation: Operation) -> RecordScope {
        let mut scope = RecordScope::head(session.head_id());
        if role_grants(session.capabilities(), entity, operation) {
            return scope;
        }

        let mut rules = Vec::new();
        if operation != Operation::Create {
            rules.push(AccessRule::PolicyGrant {
                user_id: session.user_id.clone(),
                operation,
            });
        }
        if entity == EntityKind::Activity
            && operation == Operation::Delete
            && session.capabilities().can_delete_connected_activity
        {
            rules.push(AccessRule::ConnectedContactOwner {
                user_id: session.user_id.clone(),
            });
        }

        scope.access = AccessFilter::AnyOf(rules);
        scope
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

    #[test]
    fn test_blanket_capability_is_unrestricted_within_head() {
        let session = session(RoleCapabilities {
            can_read_all_company: true,
            ..Default::default()
        });
        let scope = QueryScoper::new().scope(&session, EntityKind::Company, Operation::Read);
        assert_eq!(scope, RecordScope::head("head-1"));
    }

    #[test]
    fn test_without_capability_scope_uses_policy_grants() {
        let session = session(RoleCapabilities::default());
        let scope = QueryScoper::new().scope(&session, EntityKind::Contact, Operation::Edit);
        assert_eq!(scope.head_id, "head-1");
        assert_eq!(
            scope.access,
            AccessFilter::AnyOf(vec![AccessRule::PolicyGrant {
                user_id: "user-1".to_string(),
                operation: Operation::Edit,
            }])
        );
    }

    #[test]
    fn test_connected_activity_delete_adds_owner_rule() {
        let session = session(RoleCapabilities {
            can_delete_connected_activity: true,
            ..Default::default()
        });
        let scope = QueryScoper::new().scope(&session, EntityKind::Activity, Operation::Delete);
        assert_eq!(
            scope.access,
            AccessFilter::AnyOf(vec![
                AccessRule::PolicyGrant {
                    user_id: "user-1".to_string(),
                    operation: Operation::Delete,
                },
                AccessRule::ConnectedContactOwner {
                    user_id: "user-1".to_string(),
                },
            ])
        );
    }

    #[test]
    fn test_create_without_capability_matches_nothing() {
        let session = session(RoleCapabilities::default());
        let scope = QueryScoper::new().scope(&session, EntityKind::Contact, Operation::Create);
        assert!(scope.is_empty());
    }
}
