use tracing::debug;

use crate::auth::{EntityKind, Operation, PolicyEvaluator, QueryScoper};
use crate::domain::{DomainError, DomainResult, PolicyGrant, RecordScope, Session};

/// Trait for authorization operations
/// Enables mocking in tests while using role capabilities and policy rows in production
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthorizationProvider: Send + Sync {
    /// Check if the session may perform the operation on a record with the given policy rows
    fn check_permission(
        &self,
        session: &Session,
        entity: EntityKind,
        operation: Operation,
        grants: &[PolicyGrant],
    ) -> bool;

    /// Check permission and return PermissionDenied error if not allowed
    fn require_permission(
        &self,
        session: &Session,
        entity: EntityKind,
        operation: Operation,
        grants: &[PolicyGrant],
    ) -> DomainResult<()>;

    /// Whether an activity delete may be allowed through a contact the user owns
    fn allows_connected_activity_delete(&self, session: &Session) -> bool;

    /// Row filter for queries performing the operation
    fn scope(&self, session: &Session, entity: EntityKind, operation: Operation) -> RecordScope;
}

/// Authorization backed by role capabilities and per-record policy rows
#[derive(Debug, Clone, Default)]
pub struct RoleAuthorizationService {
    evaluator: PolicyEvaluator,
    scoper: QueryScoper,
}

impl RoleAuthorizationService {
    pub fn new() -> Self {
        Self {
            evaluator: PolicyEvaluator::new(),
            scoper: QueryScoper::new(),
        }
    }
}

impl AuthorizationProvider for RoleAuthorizationService {
    fn check_permission(
        &self,
        session: &Session,
        entity: EntityKind,
        operation: Operation,
        grants: &[PolicyGrant],
    ) -> bool {
        self.evaluator
            .is_allowed(session, entity, operation, grants)
    }

    fn require_permission(
        &self,
        session: &Session,
        entity: EntityKind,
        operation: Operation,
        grants: &[PolicyGrant],
    ) -> DomainResult<()> {
        if self.check_permission(session, entity, operation, grants) {
            return Ok(());
        }

        debug!(
            user_id = %session.user_id,
            entity = entity.as_str(),
            operation = operation.as_str(),
            "permission denied"
        );
        Err(DomainError::PermissionDenied(format!(
            "user {} cannot {} {}",
            session.user_id,
            operation.as_str(),
            entity.as_str()
        )))
    }

    fn allows_connected_activity_delete(&self, session: &Session) -> bool {
        self.evaluator.allows_connected_activity_delete(session)
    }

    fn scope(&self, session: &Session, entity: EntityKind, operation: Operation) -> RecordScope {
        self.scoper.scope(session, entity, operation)
    }
}
