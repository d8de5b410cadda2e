/**
 * Registration Handler
 *
 * This module implements the registration handler for POST /api/users/register.
 *
 * # Registration Process
 *
 * 1. Require username, email and password
 * 2. Validate their format
 * 3. Reject a username or email that is already taken
 * 4. Hash the password using bcrypt
 * 5. Create the account; the very first account becomes the admin
 * 6. Return the user (no token; the client logs in next)
 *
 * # First Account
 *
 * When no account exists yet, the new account gets the `admin` role and
 * the admin race, and is designated the privileged account if nothing is
 * designated already.
 */

use axum::{extract::State, http::StatusCode};
use bcrypt::hash;

use crate::backend::auth::handlers::types::{RegisterRequest, RegisterResponse, UserResponse};
use crate::backend::auth::users::NewUser;
use crate::backend::error::{BackendError, StoreError};
use crate::backend::extract::Json;
use crate::backend::server::state::AppState;
use crate::shared::user::{ADMIN_RACE, DEFAULT_RACE};
use crate::shared::Role;

/// Shortest accepted password
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validate username format
///
/// Usernames must be 3-30 characters of letters, digits and underscores.
pub(crate) fn is_valid_username(username: &str) -> bool {
    let length = username.chars().count();
    (3..=30).contains(&length) && username.chars().all(|c| c.is_alphanumeric() || c == '_')
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    email.contains('@')
}

pub(crate) fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

fn required(field: Option<String>) -> Option<String> {
    field.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

/// Registration handler
///
/// # Errors
///
/// * `400 Bad Request` - A field is missing or malformed, or the username or email is taken
/// * `500 Internal Server Error` - Hashing or storage failed
///
/// # Example Request
///
/// ```http
/// POST /api/users/register HTTP/1.1
/// Content-Type: application/json
///
/// {
///   "username": "reader_01",
///   "email": "reader@example.com",
///   "password": "secret123"
/// }
/// ```
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), BackendError> {
    let (Some(username), Some(email), Some(password)) = (
        required(request.username),
        required(request.email),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        tracing::warn!("Registration with missing fields");
        return Err(BackendError::validation("Please add all fields"));
    };

    tracing::info!("Registration request for username: {}, email: {}", username, email);

    if !is_valid_username(&username) {
        tracing::warn!("Invalid username format: {}", username);
        return Err(BackendError::validation(
            "Username must be 3-30 characters and contain only letters, numbers, and underscores",
        ));
    }

    if !is_valid_email(&email) {
        tracing::warn!("Invalid email format: {}", email);
        return Err(BackendError::validation("Invalid email format"));
    }

    if !is_valid_password(&password) {
        tracing::warn!("Password too short");
        return Err(BackendError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let taken = state.users.find_by_email(&email).await?.is_some()
        || state.users.find_by_username(&username).await?.is_some();
    if taken {
        tracing::warn!("User already exists: {} / {}", username, email);
        return Err(BackendError::validation("User already exists"));
    }

    let is_first_account = state.users.count().await? == 0;
    let (role, race) = if is_first_account {
        (Role::Admin, ADMIN_RACE)
    } else {
        (Role::User, DEFAULT_RACE)
    };

    let password_hash = hash(&password, state.bcrypt_cost)?;

    let user = state
        .users
        .create(NewUser {
            username,
            email,
            password_hash,
            role,
            race: race.to_string(),
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => BackendError::validation("User already exists"),
            other => other.into(),
        })?;

    if user.role == Role::Admin && state.privileged.designate_if_unset(user.id).await {
        tracing::info!("First account {} designated as the privileged account", user.username);
    }

    tracing::info!("User created successfully: {} ({})", user.username, user.role);

    let user = UserResponse::load(state.users.as_ref(), user).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user })))
}
