use http::header::AUTHORIZATION;
use http::HeaderMap;

use super::traits::AuthTokenProvider;
use crate::rpc::{domain_error_to_rpc, RpcError};

/// User context extracted from authenticated requests
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: String,
}

/// Extract user context from the request's authorization header
///
/// Expects a Bearer token and validates it using the provided AuthTokenProvider.
pub fn extract_user_context(
    headers: &HeaderMap,
    auth_token_provider: &dyn AuthTokenProvider,
) -> Result<UserContext, RpcError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| RpcError::unauthorized("Missing authorization header"))?
        .to_str()
        .map_err(|_| RpcError::unauthorized("Invalid authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .ok_or_else(|| {
            RpcError::unauthorized("Invalid authorization format, expected 'Bearer <token>'")
        })?;

    let user_id = auth_token_provider
        .validate_token(token)
        .map_err(domain_error_to_rpc)?;

    Ok(UserContext { user_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockAuthTokenProvider;
    use crate::domain::DomainError;
    use crate::rpc::RpcErrorCode;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_user_context_success() {
        let mut mock_provider = MockAuthTokenProvider::new();
        mock_provider
            .expect_validate_token()
            .with(mockall::predicate::eq("valid_token"))
            .returning(|_| Ok("user123".to_string()));

        let result = extract_user_context(&headers("Bearer valid_token"), &mock_provider);
        assert_eq!(result.unwrap().user_id, "user123");
    }

    #[test]
    fn test_extract_user_context_missing_header() {
        let mock_provider = MockAuthTokenProvider::new();

        let result = extract_user_context(&HeaderMap::new(), &mock_provider);
        assert_eq!(result.unwrap_err().code, RpcErrorCode::Unauthorized);
    }

    #[test]
    fn test_extract_user_context_invalid_format() {
        let mock_provider = MockAuthTokenProvider::new();

        let result = extract_user_context(&headers("Basic abc123"), &mock_provider);
        assert_eq!(result.unwrap_err().code, RpcErrorCode::Unauthorized);
    }

    #[test]
    fn test_extract_user_context_invalid_token() {
        let mut mock_provider = MockAuthTokenProvider::new();
        mock_provider
            .expect_validate_token()
            .returning(|_| Err(DomainError::InvalidToken("expired".to_string())));

        let result = extract_user_context(&headers("Bearer invalid_token"), &mock_provider);
        assert_eq!(result.unwrap_err().code, RpcErrorCode::Unauthorized);
    }

    #[test]
    fn test_extract_user_context_lowercase_bearer() {
        let mut mock_provider = MockAuthTokenProvider::new();
        mock_provider
            .expect_validate_token()
            .returning(|_| Ok("user456".to_string()));

        let result = extract_user_context(&headers("bearer valid_token"), &mock_provider);
        assert_eq!(result.unwrap().user_id, "user456");
    }
}
