//! Conversation Data Structure
//!
//! A conversation is the unique container for everything two users say to
//! each other, plus the daily quota state of its rate-limited participant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::DirectMessage;

/// Order-insensitive key for a participant pair
///
/// `pair_key(a, b) == pair_key(b, a)`; stores index conversations by it so
/// that at most one conversation exists per pair.
pub fn pair_key(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A direct conversation between exactly two users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique conversation ID
    pub id: Uuid,
    /// Both participants, in the order the conversation was opened
    pub participants: [Uuid; 2],
    /// Messages in conversation order
    pub messages: Vec<DirectMessage>,
    /// Messages sent by the rate-limited participant since `reset_at`
    pub send_count: u32,
    /// Start of the current counting window
    pub reset_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Last modification (append, read, or quota reset)
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Open an empty conversation between two users
    pub fn open(initiator: Uuid, counterpart: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            participants: [initiator, counterpart],
            messages: Vec::new(),
            send_count: 0,
            reset_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Order-insensitive key of this conversation's participants
    pub fn key(&self) -> (Uuid, Uuid) {
        pair_key(self.participants[0], self.participants[1])
    }

    /// Check if user is a participant
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }

    /// Get the other participant
    pub fn other_participant(&self, current_user_id: Uuid) -> Option<Uuid> {
        if !self.has_participant(current_user_id) {
            return None;
        }
        self.participants
            .iter()
            .copied()
            .find(|&id| id != current_user_id)
    }

    /// Epoch milliseconds of the last message, or of the last update when empty
    pub fn last_message_timestamp(&self) -> i64 {
        self.messages
            .last()
            .map(|m| m.created_at)
            .unwrap_or(self.updated_at)
            .timestamp_millis()
    }

    /// Mark every message addressed to `receiver_id` as read
    ///
    /// Returns how many messages changed state.
    pub fn mark_read_for(&mut self, receiver_id: Uuid) -> usize {
        self.messages
            .iter_mut()
            .filter(|m| m.receiver_id == receiver_id)
            .map(DirectMessage::mark_read)
            .filter(|changed| *changed)
            .count()
    }
}

/// One entry of `GET /api/chats/threads`
///
/// A thread is a conversation seen from one participant: it is identified by
/// the other participant's ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatThread {
    /// Same as `user_id`
    pub id: Uuid,
    /// The other participant
    pub user_id: Uuid,
    pub user_name: String,
    pub user_avatar: String,
    pub messages: Vec<DirectMessage>,
    pub last_message_timestamp: i64,
}

/// Body of `GET /api/chats/limit`
///
/// Unlimited callers get `-1` in both fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLimit {
    pub limit: i64,
    pub remaining: i64,
}

impl MessageLimit {
    /// Sentinel for callers without a quota
    pub const UNLIMITED: MessageLimit = MessageLimit { limit: -1, remaining: -1 };

    pub fn new(limit: u32, remaining: u32) -> Self {
        Self {
            limit: i64::from(limit),
            remaining: i64::from(remaining),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.limit < 0
    }
}
