//! Comments Module
//!
//! Threaded reader comments on stories and chapters.

/// Comment storage
pub mod db;

/// HTTP handlers
pub mod handlers;

pub use db::{AuthorActivity, CommentStore, MemoryCommentStore, PgCommentStore};
pub use handlers::CommentResponse;
