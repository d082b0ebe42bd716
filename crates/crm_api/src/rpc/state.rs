use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::auth::{extract_user_context, AuthTokenProvider};
use common::domain::Session;
use common::rpc::{domain_error_to_rpc, RpcError};
use std::sync::Arc;

use crate::domain::{
    ActivityService, CompanyService, ContactService, ProjectService, SessionService,
};

/// Services shared by every RPC handler
#[derive(Clone)]
pub struct CrmApiState {
    pub contact_service: Arc<ContactService>,
    pub company_service: Arc<CompanyService>,
    pub project_service: Arc<ProjectService>,
    pub activity_service: Arc<ActivityService>,
    pub session_service: Arc<SessionService>,
    pub auth_token_provider: Arc<dyn AuthTokenProvider>,
}

/// The caller's session, resolved from the bearer token
#[derive(Debug, Clone)]
pub struct AuthSession(pub Session);

#[async_trait]
impl FromRequestParts<CrmApiState> for AuthSession {
    type Rejection = RpcError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &CrmApiState,
    ) -> Result<Self, Self::Rejection> {
        let user_context =
            extract_user_context(&parts.headers, state.auth_token_provider.as_ref())?;

        let session = state
            .session_service
            .get_session(&user_context.user_id)
            .await
            .map_err(domain_error_to_rpc)?;

        Ok(AuthSession(session))
    }
}
