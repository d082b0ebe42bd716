use crate::auth::{AuthTokenProvider, JwtConfig};
use crate::domain::{DomainError, DomainResult};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims of a session token; `sub` carries the user ID
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// HS256 JWT implementation of AuthTokenProvider
pub struct JwtAuthTokenProvider {
    config: JwtConfig,
    validation: Validation,
}

impl JwtAuthTokenProvider {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        Self { config, validation }
    }
}

impl AuthTokenProvider for JwtAuthTokenProvider {
    fn validate_token(&self, token: &str) -> DomainResult<String> {
        let token_data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &self.validation,
        )
        .map_err(|e| DomainError::InvalidToken(e.to_string()))?;

        if token_data.claims.sub.is_empty() {
            return Err(DomainError::InvalidToken("missing subject".to_string()));
        }

        Ok(token_data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn test_config() -> JwtConfig {
        JwtConfig::new("test-secret-key".to_string())
    }

    /// Sign a token the way the sign-in provider does
    fn sign(config: &JwtConfig, user_id: &str) -> String {
        let now = chrono::Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: Some("test@example.com".to_string()),
            iss: config.issuer.clone(),
            exp: (now + chrono::Duration::hours(1)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_validate_token_success() {
        let provider = JwtAuthTokenProvider::new(test_config());
        let token = sign(&test_config(), "user-123");

        let user_id = provider.validate_token(&token);
        assert_eq!(user_id.unwrap(), "user-123");
    }

    #[test]
    fn test_validate_token_invalid() {
        let provider = JwtAuthTokenProvider::new(test_config());
        let result = provider.validate_token("invalid-token");
        assert!(matches!(result, Err(DomainError::InvalidToken(_))));
    }

    #[test]
    fn test_validate_token_wrong_secret() {
        let verifier = JwtAuthTokenProvider::new(JwtConfig::new("different-secret".to_string()));

        let token = sign(&test_config(), "user-123");
        let result = verifier.validate_token(&token);
        assert!(matches!(result, Err(DomainError::InvalidToken(_))));
    }

    #[test]
    fn test_validate_token_checks_issuer() {
        let verifier = JwtAuthTokenProvider::new(test_config().with_issuer("crm"));

        let token = sign(&test_config().with_issuer("other"), "user-123");
        assert!(matches!(
            verifier.validate_token(&token),
            Err(DomainError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_validate_token_expired() {
        let config = test_config();
        let now = chrono::Utc::now();
        let claims = SessionClaims {
            sub: "user-123".to_string(),
            email: None,
            iss: None,
            exp: (now - chrono::Duration::hours(2)).timestamp() as usize,
            iat: (now - chrono::Duration::hours(3)).timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        let result = JwtAuthTokenProvider::new(config).validate_token(&token);
        assert!(matches!(result, Err(DomainError::InvalidToken(_))));
    }
}
