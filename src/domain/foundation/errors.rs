//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction and contact validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        actual: f64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("No valid contact information: {reason}")]
    MissingContact { reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, actual: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing contact error.
    pub fn missing_contact(reason: impl Into<String>) -> Self {
        ValidationError::MissingContact {
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidContact,

    // State errors
    InvalidStateTransition,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidContact => "INVALID_CONTACT",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates an invalid state transition error.
    pub fn invalid_transition(from: impl fmt::Debug, to: impl fmt::Debug) -> Self {
        Self::new(
            ErrorCode::InvalidStateTransition,
            format!("Cannot transition from {:?} to {:?}", from, to),
        )
        .with_detail("from", format!("{:?}", from))
        .with_detail("to", format!("{:?}", to))
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let code = match err {
            ValidationError::MissingContact { .. } => ErrorCode::InvalidContact,
            _ => ErrorCode::ValidationFailed,
        };
        DomainError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("ticket_id");
        assert_eq!(format!("{}", err), "Field 'ticket_id' cannot be empty");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("confidence", 0.0, 1.0, 1.5);
        assert_eq!(
            format!("{}", err),
            "Field 'confidence' must be between 0 and 1, got 1.5"
        );
    }

    #[test]
    fn validation_error_missing_contact_displays_reason() {
        let err = ValidationError::missing_contact("neither email nor phone provided");
        assert_eq!(
            err.to_string(),
            "No valid contact information: neither email nor phone provided"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::new(ErrorCode::ValidationFailed, "Confidence out of range");
        assert_eq!(
            format!("{}", err),
            "[VALIDATION_FAILED] Confidence out of range"
        );
    }

    #[test]
    fn invalid_transition_records_endpoints() {
        let err = DomainError::invalid_transition("Greeting", "Ended");
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert_eq!(err.details.get("from"), Some(&"\"Greeting\"".to_string()));
    }

    #[test]
    fn missing_contact_maps_to_invalid_contact_code() {
        let err: DomainError = ValidationError::missing_contact("none").into();
        assert_eq!(err.code, ErrorCode::InvalidContact);
    }
}
