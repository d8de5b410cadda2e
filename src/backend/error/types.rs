/**
 * Backend Error Types
 *
 * This module defines the error taxonomy of the API. Every handler returns
 * `Result<_, BackendError>`, and each variant maps to exactly one HTTP status.
 *
 * # Error Categories
 *
 * ## Client Errors
 *
 * - `Validation` - missing or malformed input (400)
 * - `Unauthenticated` - missing or invalid bearer token (401)
 * - `Authorization` - role or ownership check failed (403)
 * - `NotFound` - no such user or conversation (404)
 * - `QuotaExceeded` - the daily message limit is used up (429)
 *
 * ## Server Errors
 *
 * - `ServerConfiguration` - no privileged account is provisioned (500)
 * - `Store` - the database failed (500)
 * - `Token` / `PasswordHash` - crypto primitives failed (500)
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Errors raised by the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key (username, email, participant pair, setting key) already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let conflict = err
            .as_database_error()
            .filter(|db| db.is_unique_violation())
            .map(|db| db.message().to_string());

        match conflict {
            Some(message) => Self::Conflict(message),
            None => Self::Database(err),
        }
    }
}

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use imnovel::backend::error::BackendError;
///
/// let err = BackendError::validation("Text and receiverId are required.");
/// let err = BackendError::not_found("Conversation not found");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Bad or missing input
    #[error("{message}")]
    Validation { message: String },

    /// No usable credentials were presented
    #[error("{message}")]
    Unauthenticated { message: String },

    /// The caller is authenticated but not allowed to do this
    #[error("{message}")]
    Authorization { message: String },

    /// The addressed entity does not exist
    #[error("{message}")]
    NotFound { message: String },

    /// The caller has used up today's message quota
    #[error("You have reached the limit of {limit} messages per day. Please come back tomorrow.")]
    QuotaExceeded { limit: u32 },

    /// The deployment is missing required data; not fixable by the caller
    #[error("{message}")]
    ServerConfiguration { message: String },

    /// Shared type validation failed
    #[error(transparent)]
    Shared(#[from] SharedError),

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// JWT encoding failed
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// bcrypt failed
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl BackendError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn server_configuration(message: impl Into<String>) -> Self {
        Self::ServerConfiguration {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Validation`, `Shared` - 400 Bad Request
    /// - `Unauthenticated` - 401 Unauthorized
    /// - `Authorization` - 403 Forbidden
    /// - `NotFound` - 404 Not Found
    /// - `QuotaExceeded` - 429 Too Many Requests
    /// - `Store(Conflict)` - 400 Bad Request
    /// - everything else - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Shared(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::Authorization { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Store(StoreError::Conflict(_)) => StatusCode::BAD_REQUEST,
            Self::ServerConfiguration { .. }
            | Self::Store(StoreError::Database(_))
            | Self::Token(_)
            | Self::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the message sent to the client
    ///
    /// Internal failures are reported generically; their details only go to the log.
    pub fn message(&self) -> String {
        match self {
            Self::Store(StoreError::Conflict(_)) => "Resource already exists".to_string(),
            Self::Store(StoreError::Database(_)) | Self::Token(_) | Self::PasswordHash(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}
