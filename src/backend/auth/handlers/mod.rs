//! Account Handlers Module
//!
//! HTTP handlers for the `/api/users` endpoints.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Request and response types
//! ├── signup.rs     - Registration
//! ├── login.rs      - Login
//! ├── me.rs         - Current user, profile and password
//! ├── admin.rs      - User list, role changes, deletion
//! ├── directory.rs  - Availability checks and the public list
//! ├── leaderboard.rs - Most active accounts
//! └── allies.rs     - Contractor allies
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Register**: username, email and password → account created (no token)
//! 2. **Login**: email or username plus password → `{user, token}`
//! 3. **Me**: bearer token → current account
//!
//! # Security
//!
//! - Passwords are hashed using bcrypt before storage
//! - Serialized users never carry the password hash
//! - Invalid credentials return 401 without saying which part was wrong

/// Request and response types
pub mod types;

/// Registration handler
pub mod signup;

/// Login handler
pub mod login;

/// Current user handlers
pub mod me;

/// Administration handlers
pub mod admin;

/// Public lookups
pub mod directory;

/// Ally handlers
pub mod allies;

/// Activity leaderboard
pub mod leaderboard;

pub use types::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, UserResponse};

pub use admin::{delete_user, list_users, update_role};
pub use allies::{leave_ally, manage_ally};
pub use directory::{check_email, check_username, public_users};
pub use leaderboard::leaderboard;
pub use login::login;
pub use me::{me, update_password, update_profile};
pub use signup::register;

/// In-memory state with a cheap bcrypt cost
#[cfg(test)]
pub(crate) fn test_state() -> crate::backend::server::AppState {
    use crate::backend::server::{AppState, ServerConfig};

    let config = ServerConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some("handler-test-secret".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        "QUOTA_UTC_OFFSET_MINUTES" => Some("0".to_string()),
        _ => None,
    })
    .expect("test configuration");
    AppState::in_memory(&config)
}
