//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation and layers
//! └── api_routes.rs   - Users, chats and settings routers
//! ```
//!
//! # Authentication
//!
//! Protected routes carry `auth_middleware` as a route layer, so an
//! unknown path still answers 404 rather than 401.
//!
//! # Example
//!
//! ```rust,no_run
//! use imnovel::backend::routes::create_router;
//! use imnovel::backend::server::{AppState, ServerConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let router = create_router(AppState::in_memory(&config));
//! # Ok(())
//! # }
//! ```

/// Main router creation
pub mod router;

/// API route groups
pub mod api_routes;

pub use router::create_router;
