use crate::domain::DomainResult;

/// Validates bearer tokens issued by the sign-in provider
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthTokenProvider: Send + Sync {
    /// Validate an access token and extract the user ID
    fn validate_token(&self, token: &str) -> DomainResult<String>;
}
