//! IMnovel - Community API Library
//!
//! Server for the IMnovel community site: accounts with roles and allies,
//! site settings, and rate-limited direct messaging between standard
//! users and a privileged admin account.
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types shared with clients
//!   - Roles, direct messages, thread summaries, settings
//!   - Validation errors
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server and routes
//!   - PostgreSQL and in-memory stores
//!   - JWT authentication and the messaging gateway
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables the backend and the server binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use imnovel::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(&config).await?;
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
