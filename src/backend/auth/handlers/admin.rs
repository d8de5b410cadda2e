/**
 * Account Administration Handlers
 *
 * - GET /api/users - every account (admins and contractors)
 * - PUT /api/users/{id}/role - change an account's role (admins)
 * - DELETE /api/users/{id} - delete an account, its conversations and comments (admins)
 *
 * The privileged account can be neither demoted nor deleted; direct
 * messaging depends on it.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::backend::auth::handlers::types::{UpdateRoleRequest, UserResponse};
use crate::backend::error::BackendError;
use crate::backend::extract::Json;
use crate::backend::messaging::gateway::parse_user_id;
use crate::backend::middleware::{AdminUser, AuthUser};
use crate::backend::server::state::AppState;
use crate::shared::Role;

/// List users handler
///
/// # Errors
///
/// * `403 Forbidden` - The caller is a standard user
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<UserResponse>>, BackendError> {
    if !user.role.is_staff() {
        tracing::warn!("User {} tried to list accounts", user.username);
        return Err(BackendError::forbidden(
            "You are not authorized to view the user list.",
        ));
    }

    let users = state.users.list().await?;
    let mut responses = Vec::with_capacity(users.len());
    for listed in users {
        responses.push(UserResponse::load(state.users.as_ref(), listed).await?);
    }

    Ok(Json(responses))
}

/// Update role handler
///
/// # Errors
///
/// * `400 Bad Request` - Unknown role, or the target is the privileged account
/// * `404 Not Found` - No such user
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<StatusCode, BackendError> {
    let role: Role = request
        .role
        .as_deref()
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| BackendError::validation("Invalid role specified."))?;
    let id = parse_user_id(&id)?;

    if state.privileged.is(id).await {
        return Err(BackendError::validation(
            "The role of the privileged account cannot be changed.",
        ));
    }

    let mut user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    user.role = role;
    state
        .users
        .save(&user)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    tracing::info!("{} set the role of {} to {}", admin.username, user.username, role);
    Ok(StatusCode::NO_CONTENT)
}

/// Delete user handler
///
/// Removes the user's conversations, comments, likes, bookmarks and
/// ratings first, then the account. Their stories stay, without a creator.
///
/// # Errors
///
/// * `400 Bad Request` - The target is the privileged account
/// * `404 Not Found` - No such user
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, BackendError> {
    let id = parse_user_id(&id)?;

    if state.privileged.is(id).await {
        return Err(BackendError::validation(
            "The privileged account cannot be deleted.",
        ));
    }

    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    let removed = state.gateway.forget_user(user.id).await?;
    let comments = state.comments.forget_user(user.id).await?;
    state.stories.forget_user(user.id).await?;
    state.users.delete(user.id).await?;

    tracing::info!(
        "{} deleted user {}, {} conversation(s) and {} comment(s)",
        admin.username,
        user.username,
        removed,
        comments
    );
    Ok(StatusCode::NO_CONTENT)
}
