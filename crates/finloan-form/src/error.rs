//! Error types for form operations.
//!
//! Field validation failures are not errors; they are reported through
//! [`FieldValidationResult`](crate::field::FieldValidationResult). These
//! errors cover converting a form into a typed application.

use thiserror::Error;

/// Errors raised while turning form values into a [`LoanApplication`](crate::LoanApplication).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please fill in all required fields correctly.")]
    Incomplete { invalid_fields: Vec<String> },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid value {value:?} for {field}")]
    InvalidValue { field: String, value: String },
}

/// Result type for form operations.
pub type Result<T> = std::result::Result<T, FormError>;

impl FormError {
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }
}
