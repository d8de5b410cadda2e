//! Site Settings Module
//!
//! Media settings read by the front end on start-up and edited by admins.

/// Setting storage
pub mod db;

/// HTTP handlers
pub mod handlers;

pub use db::{MemorySettingStore, PgSettingStore, SettingStore};
pub use handlers::{get_settings, update_settings};
