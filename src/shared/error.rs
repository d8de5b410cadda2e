//! Shared Error Types
//!
//! Errors raised while validating or parsing the shared data types. The
//! backend wraps them into its own error type and maps them to `400 Bad Request`.
//!
//! # Usage
//!
//! ```rust
//! use imnovel::shared::error::SharedError;
//!
//! let error = SharedError::validation("text", "Message text cannot be empty");
//! ```
use thiserror::Error;

/// Shared error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// A string did not name any variant of an enumerated type
    #[error("Invalid {kind} '{value}'")]
    UnknownVariant {
        /// Name of the enumerated type (e.g. "role")
        kind: &'static str,
        /// The rejected input
        value: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new unknown-variant error
    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
        }
    }
}
