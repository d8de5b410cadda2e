/**
 * Ally Handlers
 *
 * A contractor may recruit standard users as allies. Each user is the ally
 * of at most one contractor, recorded in the user's `ally_of` field.
 *
 * - PUT /api/users/manage-ally - contractor adds or removes an ally
 * - PUT /api/users/leave-ally - user leaves their contractor
 */

use axum::extract::State;

use crate::backend::auth::handlers::types::{AllyRef, ManageAllyRequest, UserResponse};
use crate::backend::error::BackendError;
use crate::backend::extract::Json;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::Role;

/// Add or remove an ally of the calling contractor
///
/// Returns the ally's updated account.
///
/// # Errors
///
/// * `403 Forbidden` - The caller is not a contractor
/// * `400 Bad Request` - Missing fields, unknown action, or the ally cannot be added/removed
/// * `404 Not Found` - No user with that username
pub async fn manage_ally(
    State(state): State<AppState>,
    AuthUser(contractor): AuthUser,
    Json(request): Json<ManageAllyRequest>,
) -> Result<Json<UserResponse>, BackendError> {
    if contractor.role != Role::Contractor {
        return Err(BackendError::forbidden("Only contractors can manage allies."));
    }

    let (Some(action), Some(ally_username)) = (
        request.action.filter(|a| !a.is_empty()),
        request.ally_username.filter(|u| !u.trim().is_empty()),
    ) else {
        return Err(BackendError::validation(
            "Action and allyUsername are required.",
        ));
    };

    let mut ally = state
        .users
        .find_by_username(ally_username.trim())
        .await?
        .ok_or_else(|| BackendError::not_found("User to be made an ally not found."))?;

    match action.as_str() {
        "add" => {
            if ally.role != Role::User {
                return Err(BackendError::validation(
                    "Only users with the 'user' role can become allies.",
                ));
            }
            if ally.ally_of.is_some_and(|owner| owner != contractor.id) {
                return Err(BackendError::validation(
                    "This user is already an ally of another contractor.",
                ));
            }
            ally.ally_of = Some(contractor.id);
        }
        "remove" => {
            if ally.ally_of != Some(contractor.id) {
                return Err(BackendError::validation("This user is not your ally."));
            }
            ally.ally_of = None;
        }
        _ => return Err(BackendError::validation("Invalid action.")),
    }

    let ally = state
        .users
        .save(&ally)
        .await?
        .ok_or_else(|| BackendError::not_found("User to be made an ally not found."))?;

    tracing::info!("{} {} ally {}", contractor.username, action, ally.username);

    let owner = ally.ally_of.map(|id| AllyRef {
        id,
        username: contractor.username.clone(),
    });
    Ok(Json(UserResponse::with_ally(ally, owner)))
}

/// Leave the contractor the caller is an ally of
///
/// # Errors
///
/// * `400 Bad Request` - The caller is nobody's ally
pub async fn leave_ally(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
) -> Result<Json<UserResponse>, BackendError> {
    if user.ally_of.is_none() {
        return Err(BackendError::validation("You are not an ally of anyone."));
    }

    user.ally_of = None;
    let user = state
        .users
        .save(&user)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    tracing::info!("{} left their contractor", user.username);
    Ok(Json(UserResponse::with_ally(user, None)))
}
