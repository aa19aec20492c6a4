//! Domain errors raised by the decision logic

use thiserror::Error;

/// Errors raised by the pure domain functions.
///
/// These are contract violations by the caller: they fail fast and are never
/// worth retrying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A numeric field was missing, non-finite, or out of its domain
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// An unrecognized coat/hair length category
    #[error("Invalid coat category: {0}")]
    InvalidCoatCategory(String),
}

impl DomainError {
    pub fn missing(field: &'static str) -> Self {
        DomainError::InvalidInput {
            field,
            reason: "value is required".to_string(),
        }
    }

    pub fn not_finite(field: &'static str, value: f64) -> Self {
        DomainError::InvalidInput {
            field,
            reason: format!("{} is not a finite number", value),
        }
    }

    pub fn out_of_range(field: &'static str, reason: impl Into<String>) -> Self {
        DomainError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
