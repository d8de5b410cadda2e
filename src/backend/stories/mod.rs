//! Stories Module
//!
//! The story catalog: creation and editing by staff, and the per-reader
//! likes, bookmarks and ratings.

/// Story storage
pub mod db;

/// HTTP handlers
pub mod handlers;

pub use db::{MemoryStoryStore, PgStoryStore, StoryFilter, StoryStore};
pub use handlers::StoryResponse;
