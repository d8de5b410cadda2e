/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including store selection, privileged account resolution, and route
 * configuration.
 *
 * # Initialization Process
 *
 * 1. Connect to PostgreSQL and run migrations if `DATABASE_URL` is set,
 *    otherwise use in-memory stores
 * 2. Resolve the privileged account (configured, or the single admin)
 * 3. Create and configure the router
 */

use axum::Router;
use thiserror::Error;

use crate::backend::error::StoreError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;
use crate::shared::Role;

/// Errors that stop the server from starting
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Build the application state for `config`
pub async fn build_state(config: &ServerConfig) -> Result<AppState, InitError> {
    let state = match &config.database_url {
        Some(url) => AppState::postgres(load_database(url).await?, config),
        None => {
            tracing::warn!("DATABASE_URL not set. Using in-memory stores; data is lost on restart.");
            AppState::in_memory(config)
        }
    };

    resolve_privileged_account(&state).await?;
    Ok(state)
}

/// Make sure the privileged account is designated if it can be
///
/// A configured account is kept as is. Otherwise the oldest admin is
/// designated; with no admin at all the first registration does it.
pub async fn resolve_privileged_account(state: &AppState) -> Result<(), StoreError> {
    if let Some(id) = state.privileged.get().await {
        if state.users.find_by_id(id).await?.is_none() {
            tracing::warn!("PRIVILEGED_ACCOUNT_ID {} does not match any user", id);
        }
        return Ok(());
    }

    let admins = state.users.find_by_role(Role::Admin).await?;
    match admins.as_slice() {
        [] => {
            tracing::info!("No admin yet; the first registered user will receive direct messages");
        }
        [admin] => {
            state.privileged.designate_if_unset(admin.id).await;
        }
        [oldest, ..] => {
            tracing::warn!(
                "{} admins found; using the oldest ({}). Set PRIVILEGED_ACCOUNT_ID to choose another.",
                admins.len(),
                oldest.username
            );
            state.privileged.designate_if_unset(oldest.id).await;
        }
    }
    Ok(())
}

/// Create and configure the Axum application
pub async fn create_app(config: &ServerConfig) -> Result<Router<()>, InitError> {
    tracing::info!("Initializing IMnovel backend server");

    let state = build_state(config).await?;
    let app = create_router(state);

    tracing::info!("Router configured");
    Ok(app)
}
