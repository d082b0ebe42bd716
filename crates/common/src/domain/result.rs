use thiserror::Error;

use crate::auth::EntityKind;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Contact {0} cannot be linked to itself")]
    SelfLink(String),

    #[error("Invalid link mode: {0}")]
    InvalidLinkMode(i32),

    #[error("Invalid project status: {0}")]
    InvalidProjectStatus(String),

    #[error("Invalid activity type: {0}")]
    InvalidActivityType(String),

    #[error("Unsupported association: {0} <-> {1}")]
    UnsupportedAssociation(String, String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Not-found error for a record of the given kind
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        let id = id.into();
        match entity {
            EntityKind::Contact => DomainError::ContactNotFound(id),
            EntityKind::Company => DomainError::CompanyNotFound(id),
            EntityKind::Project => DomainError::ProjectNotFound(id),
            EntityKind::Activity => DomainError::ActivityNotFound(id),
        }
    }
}
