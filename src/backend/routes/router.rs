/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route groups into a single Axum router.
 *
 * # Layers
 *
 * - `CorsLayer::permissive()` - the browser frontend is served from another origin
 * - `TraceLayer::new_for_http()` - one span per request
 * - `DefaultBodyLimit` - settings carry inline media, so bodies may be large
 */

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::error::BackendError;
use crate::backend::routes::api_routes::{
    chat_routes, comment_routes, settings_routes, story_routes, user_routes,
};
use crate::backend::server::state::AppState;

/// Largest accepted request body
pub const REQUEST_BODY_LIMIT: usize = 100 * 1024 * 1024;

const WELCOME: &str = "Welcome to the IMnovel Team API. The service is running correctly. Please use the frontend application to interact with the API.";

/// Create the Axum router with all routes configured
///
/// 1. **Liveness**: `GET /` and `GET /api`
/// 2. **API Routes**: users, stories, comments, chats, settings
/// 3. **Fallback Handler**: JSON 404 for unknown routes
pub fn create_router(app_state: AppState) -> Router<()> {
    Router::new()
        .route("/", get(|| async { WELCOME }))
        .route("/api", get(|| async { "API is running..." }))
        .nest("/api/users", user_routes(&app_state))
        .nest("/api/stories", story_routes(&app_state))
        .nest("/api/comments", comment_routes(&app_state))
        .nest("/api/chats", chat_routes(&app_state))
        .nest("/api/settings", settings_routes(&app_state))
        .fallback(|| async { BackendError::not_found("Not Found") })
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
