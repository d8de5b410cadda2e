//! Backend Module
//!
//! This module contains all server-side code for the IMnovel community API:
//! an Axum HTTP server over PostgreSQL (or in-memory stores when no
//! database is configured).
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - Router assembly and layers
//! - **`auth`** - Accounts, JWT sessions, account handlers
//! - **`stories`** - Story catalog, likes, bookmarks and ratings
//! - **`comments`** - Story comments
//! - **`messaging`** - Rate-limited direct messages
//! - **`settings`** - Site settings
//! - **`middleware`** - Bearer-token authentication and role extractors
//! - **`error`** - Backend error types and their HTTP mapping
//! - **`extract`** - JSON extractor reporting bad bodies as `BackendError`
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Configuration, state, initialization
//! ├── routes/         - Route configuration
//! ├── auth/           - Accounts and sessions
//! ├── stories/        - Story catalog
//! ├── comments/       - Story comments
//! ├── messaging/      - Direct messages and quotas
//! ├── settings/       - Site settings
//! ├── middleware/     - Request middleware
//! ├── extract.rs      - JSON extractor
//! └── error/          - Error types
//! ```
//!
//! # State Management
//!
//! Handlers share an `AppState` holding the stores behind `Arc<dyn …>`
//! trait objects, the message gateway, the session keys and the
//! privileged account handle. Stores are safe for concurrent use; the
//! quota check and the message append happen in one atomic step.
//!
//! # Example
//!
//! ```rust,no_run
//! use imnovel::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(&config).await?;
//! let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Backend error types
pub mod error;

/// Accounts and sessions
pub mod auth;

/// Middleware for request processing
pub mod middleware;

/// Request extractors
pub mod extract;

/// Story catalog
pub mod stories;

/// Story comments
pub mod comments;

/// Direct messaging
pub mod messaging;

/// Site settings
pub mod settings;

pub use error::{BackendError, StoreError};
pub use messaging::MessageGateway;
pub use server::{create_app, AppState, ServerConfig};
