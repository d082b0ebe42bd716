pub mod activity_service;
pub mod company_service;
pub mod contact_service;
pub mod project_service;
pub mod record_access;
pub mod related_loader;
pub mod session_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use activity_service::*;
pub use company_service::*;
pub use contact_service::*;
pub use project_service::*;
pub use record_access::*;
pub use related_loader::*;
pub use session_service::*;

/// Store empty optional text as absent
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
