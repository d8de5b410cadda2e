/**
 * Login Handler
 *
 * This module implements the authentication handler for POST /api/users/login.
 *
 * # Authentication Process
 *
 * 1. Look up the user by email or username
 * 2. Verify the password using bcrypt
 * 3. Generate a JWT token
 * 4. Return the user and the token
 *
 * # Security
 *
 * - An unknown identifier and a wrong password give the same 401
 * - Password verification uses constant-time comparison (via bcrypt)
 */

use axum::extract::State;
use bcrypt::verify;

use crate::backend::auth::handlers::types::{AuthResponse, LoginRequest, UserResponse};
use crate::backend::error::BackendError;
use crate::backend::extract::Json;
use crate::backend::server::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Login handler
///
/// # Errors
///
/// * `401 Unauthorized` - Unknown identifier or wrong password
/// * `500 Internal Server Error` - Storage or token generation failed
///
/// # Example Request
///
/// ```http
/// POST /api/users/login HTTP/1.1
/// Content-Type: application/json
///
/// {
///   "loginIdentifier": "reader@example.com",
///   "password": "secret123"
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, BackendError> {
    let identifier = request.login_identifier.unwrap_or_default();
    let identifier = identifier.trim();
    let password = request.password.unwrap_or_default();

    if identifier.is_empty() || password.is_empty() {
        tracing::warn!("Login with missing credentials");
        return Err(BackendError::unauthenticated(INVALID_CREDENTIALS));
    }

    tracing::info!("Login request for: {}", identifier);

    let user = state.users.find_by_login(identifier).await?.ok_or_else(|| {
        tracing::warn!("User not found: {}", identifier);
        BackendError::unauthenticated(INVALID_CREDENTIALS)
    })?;

    // A malformed stored hash is treated like a mismatch
    let valid = verify(&password, &user.password_hash).unwrap_or_else(|e| {
        tracing::error!("Password verification error for {}: {:?}", user.username, e);
        false
    });

    if !valid {
        tracing::warn!("Invalid password for user: {}", identifier);
        return Err(BackendError::unauthenticated(INVALID_CREDENTIALS));
    }

    let token = state.sessions.create_token(user.id, &user.username)?;

    tracing::info!("User logged in successfully: {}", user.username);

    let user = UserResponse::load(state.users.as_ref(), user).await?;
    Ok(Json(AuthResponse { user, token }))
}
