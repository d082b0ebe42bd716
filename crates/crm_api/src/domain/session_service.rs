use common::domain::{DomainError, DomainResult, GetSessionRepoInput, Session, UserRepository};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Resolves authenticated user IDs into sessions
pub struct SessionService {
    user_repository: Arc<dyn UserRepository>,
}

impl SessionService {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    /// Load the user with its role and head; unknown users are rejected
    #[instrument(skip(self))]
    pub async fn get_session(&self, user_id: &str) -> DomainResult<Session> {
        let session = self
            .user_repository
            .get_session(GetSessionRepoInput {
                user_id: user_id.to_string(),
            })
            .await?
            .ok_or_else(|| DomainError::UserNotFound(user_id.to_string()))?;

        debug!(head_id = %session.head.id, role = %session.role.name, "session loaded");
        Ok(session)
    }
}
