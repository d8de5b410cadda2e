//! Public account lookups: availability checks for the registration form
//! and the public member list.

use axum::extract::State;

use crate::backend::auth::handlers::types::{
    Availability, CheckEmailRequest, CheckUsernameRequest, PublicUser,
};
use crate::backend::error::BackendError;
use crate::backend::extract::Json;
use crate::backend::server::state::AppState;

/// `POST /api/users/check-username`
pub async fn check_username(
    State(state): State<AppState>,
    Json(request): Json<CheckUsernameRequest>,
) -> Result<Json<Availability>, BackendError> {
    let username = request
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| BackendError::validation("Username is required"))?;

    let available = state.users.find_by_username(&username).await?.is_none();
    Ok(Json(Availability { available }))
}

/// `POST /api/users/check-email`
pub async fn check_email(
    State(state): State<AppState>,
    Json(request): Json<CheckEmailRequest>,
) -> Result<Json<Availability>, BackendError> {
    let email = request
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| BackendError::validation("Email is required"))?;

    let available = state.users.find_by_email(&email).await?.is_none();
    Ok(Json(Availability { available }))
}

/// `GET /api/users/public`
pub async fn public_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, BackendError> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}
