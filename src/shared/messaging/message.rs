//! Direct Message Data Structure
//!
//! A single message inside a conversation. Messages are owned by their
//! conversation and never addressed on their own; the only field that
//! changes after creation is `is_read`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest message body accepted by the gateway, in characters
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// A message exchanged between two participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    /// Unique message ID
    pub id: Uuid,
    /// Author of the message
    pub sender_id: Uuid,
    /// Participant the message is addressed to
    pub receiver_id: Uuid,
    /// Message body
    pub text: String,
    /// Set once the receiver has opened the thread
    pub is_read: bool,
    /// When the message was appended
    pub created_at: DateTime<Utc>,
    /// `created_at` as Unix epoch milliseconds, for clients that sort numerically
    pub timestamp: i64,
}

impl DirectMessage {
    /// Create a new unread message
    pub fn new(
        sender_id: Uuid,
        receiver_id: Uuid,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::restore(Uuid::new_v4(), sender_id, receiver_id, text, false, created_at)
    }

    /// Rebuild a message from stored fields
    pub fn restore(
        id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        text: impl Into<String>,
        is_read: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sender_id,
            receiver_id,
            text: text.into(),
            is_read,
            created_at,
            timestamp: created_at.timestamp_millis(),
        }
    }

    /// Mark the message as read. Returns `true` if the flag changed.
    pub fn mark_read(&mut self) -> bool {
        let changed = !self.is_read;
        self.is_read = true;
        changed
    }
}

/// Body of `POST /api/chats/send`
///
/// `receiver_id` is kept as raw JSON: standard users may send anything
/// there since it is overridden, so it is only interpreted when it is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Message body
    #[serde(default)]
    pub text: Option<String>,
    /// Requested receiver (ignored for rate-limited senders)
    #[serde(default)]
    pub receiver_id: Option<serde_json::Value>,
}

impl SendMessageRequest {
    /// The requested receiver as text, `None` when absent or null
    ///
    /// Non-string values are rendered as JSON so that a sender who is not
    /// rate limited gets them reported as an invalid id.
    pub fn requested_receiver(&self) -> Option<String> {
        match self.receiver_id.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(raw) => Some(raw.clone()),
            other => Some(other.to_string()),
        }
    }
}
