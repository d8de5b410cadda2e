/**
 * Error Conversion
 *
 * All backend errors implement `IntoResponse` from Axum, so handlers can
 * return them directly. Conversion is also the single place where failures
 * are logged, at a severity chosen by what the failure means:
 *
 * - configuration and storage failures: `error` (operator must act)
 * - quota exhaustion: `debug` (expected, frequent)
 * - everything else: `warn`
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 400
 * }
 * ```
 *
 * Quota errors also carry `"limit"` and `"remaining": 0`.
 */

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;

/// Unreadable request bodies are the client's fault
impl From<JsonRejection> for BackendError {
    fn from(rejection: JsonRejection) -> Self {
        BackendError::validation(rejection.body_text())
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        match &self {
            BackendError::QuotaExceeded { limit } => {
                tracing::debug!("Daily message quota of {} reached", limit);
            }
            BackendError::ServerConfiguration { .. } => {
                tracing::error!("Server misconfiguration: {}", self);
            }
            _ if status.is_server_error() => {
                tracing::error!("Request failed: {:?}", self);
            }
            _ => {
                tracing::warn!("Request rejected ({}): {}", status.as_u16(), self);
            }
        }

        let body = match &self {
            BackendError::QuotaExceeded { limit } => serde_json::json!({
                "error": message,
                "status": status.as_u16(),
                "limit": limit,
                "remaining": 0,
            }),
            _ => serde_json::json!({
                "error": message,
                "status": status.as_u16(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
