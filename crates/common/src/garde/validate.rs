use crate::domain::DomainError;
use garde::{Report, Validate};

/// Convert garde validation report to DomainError
pub fn validate_struct<T>(value: &T) -> Result<(), DomainError>
where
    T: Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| DomainError::ValidationError(format_validation_errors(&report)))
}

fn format_validation_errors(report: &Report) -> String {
    report
        .iter()
        .map(|(path, error)| {
            let path = path.to_string();
            if path.is_empty() {
                error.message().to_string()
            } else {
                format!("{}: {}", path, error.message())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Validate)]
struct EmailAddress(#[garde(email)] String);

/// Custom rule: the field is absent, empty, or a valid email address
pub fn email_or_empty(value: &Option<String>, _ctx: &()) -> garde::Result {
    match value.as_deref() {
        None | Some("") => Ok(()),
        Some(email) => EmailAddress(email.to_string())
            .validate()
            .map_err(|_| garde::Error::new("not a valid email")),
    }
}

/// Custom rule: every ID in the list is non-empty
#[allow(clippy::ptr_arg)]
pub fn non_empty_ids(value: &Vec<String>, _ctx: &()) -> garde::Result {
    if value.iter().any(|id| id.trim().is_empty()) {
        return Err(garde::Error::new("ids must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use garde::Validate;

    #[derive(Validate)]
    struct TestRequest {
        #[garde(length(chars, min = 2, max = 50))]
        name: String,
        #[garde(custom(email_or_empty))]
        email: Option<String>,
    }

    fn request(name: &str, email: Option<&str>) -> TestRequest {
        TestRequest {
            name: name.to_string(),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_success() {
        assert!(validate_struct(&request("Ada", None)).is_ok());
        assert!(validate_struct(&request("Ada", Some(""))).is_ok());
        assert!(validate_struct(&request("Ada", Some("ada@example.com"))).is_ok());
    }

    #[test]
    fn test_validate_failure_names_field() {
        let result = validate_struct(&request("A", None));
        match result {
            Err(DomainError::ValidationError(msg)) => assert!(msg.contains("name")),
            other => panic!("expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_email_rejected() {
        let result = validate_struct(&request("Ada", Some("not-an-email")));
        match result {
            Err(DomainError::ValidationError(msg)) => assert!(msg.contains("email")),
            other => panic!("expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_non_empty_ids() {
        assert!(non_empty_ids(&vec!["a".to_string()], &()).is_ok());
        assert!(non_empty_ids(&vec![" ".to_string()], &()).is_err());
    }
}
