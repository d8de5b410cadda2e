//! Shared Module
//!
//! Types and data structures that are independent of the server runtime.
//! They describe what the API sends and receives, and are serialized with
//! serde using camelCase field names.

/// Story comments
pub mod comment;

/// Shared error types
pub mod error;

/// Direct messaging types
pub mod messaging;

/// Site setting types
pub mod setting;

/// Story catalog types
pub mod story;

/// Account roles
pub mod user;

/// Re-export commonly used types for convenience
pub use comment::{Comment, CreateCommentRequest, NewComment};
pub use error::SharedError;
pub use messaging::{ChatThread, Conversation, DirectMessage, MessageLimit};
pub use setting::{MediaType, Setting, SettingInput};
pub use story::{Story, StoryInput, StoryStatus};
pub use user::Role;
