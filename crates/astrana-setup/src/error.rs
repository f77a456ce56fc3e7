use std::fmt;

use thiserror::Error;

use crate::services::Failure;
use crate::wizard::{Field, WizardStep};

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Setup rejected by server: {}", join_failures(.0))]
    ServerValidation(Vec<Failure>),

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: WizardStep, to: WizardStep },

    #[error("Not allowed: {0}")]
    NotAllowed(String),

    #[error("User cancelled")]
    UserCancelled,
}

/// The single error type returned by the gateway and every resource service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication rejected — access token invalid or expired")]
    AuthRejected,

    #[error("Server error {status}: {message}")]
    Server {
        status: u16,
        message: String,
        failures: Vec<Failure>,
    },

    #[error("Response contained no {resource}")]
    NoPayload { resource: &'static str },

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationKind {
    Required,
    TooShort { min: usize },
    TooLong { max: usize },
    Pattern,
    Mismatch { other: Field },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: Field,
    pub kind: ValidationKind,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.field.key();
        match &self.kind {
            ValidationKind::Required => write!(f, "{name} is required"),
            ValidationKind::TooShort { min } => {
                write!(f, "{name} must be at least {min} characters")
            }
            ValidationKind::TooLong { max } => {
                write!(f, "{name} must be at most {max} characters")
            }
            ValidationKind::Pattern => write!(f, "{name} has an invalid format"),
            ValidationKind::Mismatch { other } => {
                write!(f, "{name} does not match {}", other.key())
            }
        }
    }
}

/// Every rule violation found on one step, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn has(&self, field: Field) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

fn join_failures(failures: &[Failure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.item_id, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_server() {
        let err = ApiError::Server {
            status: 500,
            message: "boom".into(),
            failures: vec![],
        };
        assert!(format!("{err}").contains("500"));
        assert!(format!("{err}").contains("boom"));
    }

    #[test]
    fn test_error_display_no_payload() {
        let err = ApiError::NoPayload {
            resource: "languages",
        };
        assert_eq!(format!("{err}"), "Response contained no languages");
    }

    #[test]
    fn test_error_display_config() {
        let err = ConfigError::InvalidValue {
            field: "api.timeout_secs".into(),
            value: "0".into(),
        };
        assert_eq!(format!("{err}"), "Invalid value for api.timeout_secs: 0");
    }

    #[test]
    fn test_validation_display() {
        let errors = ValidationErrors(vec![
            ValidationError {
                field: Field::Username,
                kind: ValidationKind::TooShort { min: 6 },
            },
            ValidationError {
                field: Field::ConfirmPassword,
                kind: ValidationKind::Mismatch {
                    other: Field::Password,
                },
            },
        ]);
        let text = errors.to_string();
        assert!(text.contains("username must be at least 6 characters"));
        assert!(text.contains("confirmPassword does not match password"));
        assert!(errors.has(Field::Username));
        assert!(!errors.has(Field::EmailAddress));
    }

    #[test]
    fn test_wizard_error_from_api() {
        let we: WizardError = ApiError::AuthRejected.into();
        assert!(format!("{we}").contains("Authentication rejected"));
    }

    #[test]
    fn test_server_validation_display() {
        let err = WizardError::ServerValidation(vec![Failure {
            item_id: "username".into(),
            message: "Username already taken".into(),
        }]);
        assert!(format!("{err}").contains("username: Username already taken"));
    }
}
