//! Accounts Module
//!
//! This module handles registration, login, profiles, roles and allies.
//! It provides the account store, JWT session keys and the HTTP handlers
//! for the `/api/users` endpoints.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── users.rs        - User model and UserStore (PostgreSQL and in-memory)
//! ├── sessions.rs     - JWT token management
//! └── handlers/       - HTTP handlers
//! ```
//!
//! # Security
//!
//! - Passwords are hashed using bcrypt before storage
//! - JWT tokens are used for stateless authentication
//! - Tokens expire after `JWT_TTL_DAYS` (30 by default)
//! - A token whose account was deleted is rejected

/// User data model and storage
pub mod users;

/// JWT token generation and validation
pub mod sessions;

/// HTTP handlers for account endpoints
pub mod handlers;

pub use handlers::types::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
pub use sessions::{Claims, SessionKeys};
pub use users::{MemoryUserStore, NewUser, PgUserStore, User, UserStore};
