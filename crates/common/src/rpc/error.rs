use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::domain::DomainError;

/// Error codes returned to RPC clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InternalServerError,
}

impl RpcErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            RpcErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            RpcErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            RpcErrorCode::Forbidden => StatusCode::FORBIDDEN,
            RpcErrorCode::NotFound => StatusCode::NOT_FOUND,
            RpcErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned from an RPC procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalServerError, message)
    }
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: &'a RpcError,
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        (status, Json(ErrorEnvelope { error: &self })).into_response()
    }
}

impl From<DomainError> for RpcError {
    fn from(error: DomainError) -> Self {
        domain_error_to_rpc(error)
    }
}

/// Convert domain error to an RPC error
pub fn domain_error_to_rpc(error: DomainError) -> RpcError {
    match error {
        DomainError::ContactNotFound(id) => RpcError::not_found(format!("Contact not found: {}", id)),
        DomainError::CompanyNotFound(id) => RpcError::not_found(format!("Company not found: {}", id)),
        DomainError::ProjectNotFound(id) => RpcError::not_found(format!("Project not found: {}", id)),
        DomainError::ActivityNotFound(id) => {
            RpcError::not_found(format!("Activity not found: {}", id))
        }

        DomainError::UserNotFound(id) => RpcError::unauthorized(format!("Unknown user: {}", id)),

        DomainError::SelfLink(id) => {
            RpcError::bad_request(format!("Contact {} cannot be linked to itself", id))
        }

        DomainError::InvalidLinkMode(mode) => {
            RpcError::bad_request(format!("Invalid link mode: {}", mode))
        }

        DomainError::InvalidProjectStatus(msg)
        | DomainError::InvalidActivityType(msg)
        | DomainError::ValidationError(msg) => RpcError::bad_request(msg),

        DomainError::UnsupportedAssociation(owner, related) => RpcError::bad_request(format!(
            "Cannot associate {} with {}",
            owner, related
        )),

        DomainError::MissingCredentials(msg) => RpcError::unauthorized(msg),

        DomainError::InvalidToken(msg) => RpcError::unauthorized(format!("Invalid token: {}", msg)),

        DomainError::PermissionDenied(msg) => RpcError::forbidden(msg),

        DomainError::RepositoryError(err) => {
            error!(error = %err, "repository error");
            RpcError::internal("Internal error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_codes() {
        assert_eq!(
            domain_error_to_rpc(DomainError::PermissionDenied("no".into())).code,
            RpcErrorCode::Forbidden
        );
        assert_eq!(
            domain_error_to_rpc(DomainError::SelfLink("c1".into())).code,
            RpcErrorCode::BadRequest
        );
        assert_eq!(
            domain_error_to_rpc(DomainError::InvalidLinkMode(7)).code,
            RpcErrorCode::BadRequest
        );
        assert_eq!(
            domain_error_to_rpc(DomainError::CompanyNotFound("co1".into())).code,
            RpcErrorCode::NotFound
        );
        assert_eq!(
            domain_error_to_rpc(DomainError::InvalidToken("expired".into())).code,
            RpcErrorCode::Unauthorized
        );
        assert_eq!(
            domain_error_to_rpc(DomainError::RepositoryError(anyhow::anyhow!("db down"))).code,
            RpcErrorCode::InternalServerError
        );
    }

    #[test]
    fn test_error_code_serializes_screaming_snake_case() {
        let body = serde_json::to_value(RpcError::forbidden("nope")).unwrap();
        assert_eq!(body["code"], "FORBIDDEN");
        assert_eq!(
            serde_json::to_value(RpcErrorCode::InternalServerError).unwrap(),
            "INTERNAL_SERVER_ERROR"
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = RpcError::bad_request("bad").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
