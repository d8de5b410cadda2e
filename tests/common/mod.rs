//! Common test utilities and helpers
//!
//! - `app` - the router over in-memory stores, plus a request helper
//! - `auth_helpers` - register, login, role changes
//! - `assertions` - status assertions that print the body on failure
//! - `database` - PostgreSQL fixture, active when `DATABASE_URL` is set

#[macro_use]
pub mod assertions;
pub mod app;
pub mod auth_helpers;
pub mod database;

pub use app::{TestApp, TestResponse};
pub use auth_helpers::*;
