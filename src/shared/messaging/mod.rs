//! Messaging Module
//!
//! Data structures for direct messaging:
//!
//! - `Conversation` - The per-pair container of messages and quota state
//! - `DirectMessage` - A message in a conversation
//! - `ChatThread` - A conversation as seen by one participant
//! - `MessageLimit` - Remaining daily quota
//!
//! # Usage
//!
//! ```rust
//! use imnovel::shared::messaging::{Conversation, DirectMessage, ChatThread, MessageLimit};
//! ```

pub mod conversation;
pub mod message;

// Re-export all types
pub use conversation::{pair_key, ChatThread, Conversation, MessageLimit};
pub use message::{DirectMessage, SendMessageRequest, MAX_MESSAGE_LENGTH};
