/**
 * Authentication Middleware
 *
 * This module provides middleware for protecting routes that require
 * user authentication. It extracts and verifies JWT tokens from the
 * Authorization header, loads the account the token names, and provides
 * it to handlers through the `AuthUser` and `AdminUser` extractors.
 *
 * A token whose account has been deleted is rejected like a bad token.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::users::User;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::Role;

/// Account attached to the request by `auth_middleware`
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub User);

/// Authentication middleware
///
/// 1. Extracts the bearer token from the Authorization header
/// 2. Verifies the token
/// 3. Loads the user named by the token's `sub` claim
/// 4. Attaches the user to the request extensions
///
/// Returns 401 Unauthorized if any step fails.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| BackendError::unauthenticated("Not authorized, no token"))?;

    let claims = app_state.sessions.verify_token(token).map_err(|e| {
        tracing::debug!("Token rejected: {:?}", e);
        BackendError::unauthenticated("Not authorized, token failed")
    })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| BackendError::unauthenticated("Not authorized, token failed"))?;

    let user = app_state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| BackendError::unauthenticated("Not authorized, user not found"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated user
///
/// Only usable on routes behind `auth_middleware`.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|AuthenticatedUser(user)| AuthUser(user.clone()))
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                BackendError::unauthenticated("Not authorized, no token")
            })
    }
}

/// Axum extractor that additionally requires the `admin` role
#[derive(Clone, Debug)]
pub struct AdminUser(pub User);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(BackendError::forbidden("Not authorized as an admin"));
        }
        Ok(AdminUser(user))
    }
}
