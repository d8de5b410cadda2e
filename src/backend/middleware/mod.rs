//! Middleware Module
//!
//! This module contains the HTTP middleware for the backend server.
//!
//! - **`auth`** - bearer-token authentication and the `AuthUser` /
//!   `AdminUser` extractors built on it
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{middleware, routing::get, Router};
//! use imnovel::backend::middleware::{auth_middleware, AuthUser};
//! use imnovel::backend::server::state::AppState;
//!
//! async fn whoami(AuthUser(user): AuthUser) -> String {
//!     user.username
//! }
//!
//! fn routes(state: AppState) -> Router<AppState> {
//!     Router::new()
//!         .route("/whoami", get(whoami))
//!         .route_layer(middleware::from_fn_with_state(state, auth_middleware))
//! }
//! ```

pub mod auth;

pub use auth::{auth_middleware, AdminUser, AuthUser, AuthenticatedUser};
