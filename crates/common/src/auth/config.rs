/// Configuration for validating bearer tokens issued by the sign-in provider
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Expected `iss` claim; not checked when unset
    pub issuer: Option<String>,
}

impl JwtConfig {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            issuer: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}
