/**
 * Direct-Message Gateway
 *
 * All direct-message rules live here; the HTTP handlers only extract the
 * caller and forward to these operations.
 *
 * # Routing
 *
 * - `user` senders always write to the privileged account. Whatever
 *   receiver they name is ignored.
 * - `admin` and `contractor` senders write to the receiver they name.
 *
 * # Quota
 *
 * Sends by `user` senders are counted per conversation and capped at
 * `QuotaPolicy::daily_limit` per calendar day. The window is reset lazily,
 * on the first send or quota query of a new day. The counter increment and
 * the append are a single store operation, so concurrent sends cannot
 * overshoot the cap.
 */

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use crate::backend::auth::users::UserStore;
use crate::backend::error::BackendError;
use crate::backend::messaging::clock::{Clock, SystemClock};
use crate::backend::messaging::db::{AppendOutcome, ConversationStore};
use crate::backend::messaging::privileged::PrivilegedAccount;
use crate::backend::messaging::quota::QuotaPolicy;
use crate::shared::messaging::{
    ChatThread, Conversation, DirectMessage, MessageLimit, MAX_MESSAGE_LENGTH,
};
use crate::shared::Role;

/// Display name used for threads whose other participant was deleted
const MISSING_PARTICIPANT_NAME: &str = "Admin";

/// Parse a user ID taken from a path or body
pub fn parse_user_id(raw: &str) -> Result<Uuid, BackendError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| BackendError::validation(format!("Invalid user id: {raw}")))
}

#[derive(Clone)]
pub struct MessageGateway {
    conversations: Arc<dyn ConversationStore>,
    users: Arc<dyn UserStore>,
    privileged: PrivilegedAccount,
    policy: QuotaPolicy,
    clock: Arc<dyn Clock>,
}

impl MessageGateway {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        users: Arc<dyn UserStore>,
        privileged: PrivilegedAccount,
        policy: QuotaPolicy,
    ) -> Self {
        Self {
            conversations,
            users,
            privileged,
            policy,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    // Stored timestamps have microsecond precision; keep ours comparable
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(6)
    }

    /// Send a message
    ///
    /// Returns the stored message. Fails with `QuotaExceeded` once a
    /// rate-limited sender has used up today's quota; nothing is stored then.
    pub async fn send(
        &self,
        sender_id: Uuid,
        sender_role: Role,
        requested_receiver: Option<&str>,
        text: Option<&str>,
    ) -> Result<DirectMessage, BackendError> {
        let privileged = self.privileged.require().await?;

        let receiver_id = if sender_role.is_rate_limited() {
            Some(privileged)
        } else {
            match requested_receiver.map(str::trim).filter(|r| !r.is_empty()) {
                Some(raw) => Some(parse_user_id(raw)?),
                None => None,
            }
        };

        let text = text.filter(|t| !t.trim().is_empty());
        let (Some(text), Some(receiver_id)) = (text, receiver_id) else {
            return Err(BackendError::validation("Text and receiverId are required."));
        };
        if text.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(BackendError::validation(format!(
                "Message must be at most {MAX_MESSAGE_LENGTH} characters."
            )));
        }
        if receiver_id == sender_id {
            return Err(BackendError::validation("Cannot send message to yourself."));
        }

        if !sender_role.is_rate_limited() && self.users.find_by_id(receiver_id).await?.is_none() {
            return Err(BackendError::not_found("Receiver not found"));
        }

        let now = self.now();
        let conversation = self.find_or_open(sender_id, receiver_id, now).await?;
        let conversation_id = conversation.id;

        let limit = if sender_role.is_rate_limited() {
            self.current_window(conversation, now).await?;
            Some(self.policy.daily_limit)
        } else {
            None
        };

        let message = DirectMessage::new(sender_id, receiver_id, text, now);

        match self
            .conversations
            .append_message(conversation_id, &message, limit)
            .await?
        {
            AppendOutcome::Appended { send_count } => {
                tracing::debug!(
                    "Message {} from {} to {} stored (count {})",
                    message.id,
                    sender_id,
                    receiver_id,
                    send_count
                );
                Ok(message)
            }
            AppendOutcome::LimitReached => Err(BackendError::QuotaExceeded {
                limit: self.policy.daily_limit,
            }),
            AppendOutcome::Missing => Err(BackendError::not_found("Conversation not found")),
        }
    }

    /// All threads of `user_id`, most recently active first
    pub async fn threads(&self, user_id: Uuid) -> Result<Vec<ChatThread>, BackendError> {
        let conversations = self.conversations.list_for_user(user_id).await?;
        let mut threads = Vec::with_capacity(conversations.len());

        for conversation in conversations {
            let Some(other_id) = conversation.other_participant(user_id) else {
                continue;
            };
            let last_message_timestamp = conversation.last_message_timestamp();

            let (user_name, user_avatar) = match self.users.find_by_id(other_id).await? {
                Some(other) => (other.display_name().to_string(), other.picture),
                None => (MISSING_PARTICIPANT_NAME.to_string(), String::new()),
            };

            threads.push(ChatThread {
                id: other_id,
                user_id: other_id,
                user_name,
                user_avatar,
                messages: conversation.messages,
                last_message_timestamp,
            });
        }

        Ok(threads)
    }

    /// Mark everything `other_user_id` sent to `user_id` as read
    ///
    /// Succeeds without doing anything when the two never talked.
    pub async fn mark_read(&self, user_id: Uuid, other_user_id: Uuid) -> Result<(), BackendError> {
        let Some(conversation) = self
            .conversations
            .find_by_pair(user_id, other_user_id)
            .await?
        else {
            return Ok(());
        };

        let changed = self
            .conversations
            .mark_read(conversation.id, user_id, self.now())
            .await?;
        tracing::debug!("Marked {} messages read for {}", changed, user_id);
        Ok(())
    }

    /// Remaining messages for today
    ///
    /// Does not create a conversation, but does persist a due window reset.
    pub async fn quota(&self, user_id: Uuid, role: Role) -> Result<MessageLimit, BackendError> {
        if !role.is_rate_limited() {
            return Ok(MessageLimit::UNLIMITED);
        }

        let privileged = self.privileged.require().await?;
        let limit = self.policy.daily_limit;

        let Some(conversation) = self.conversations.find_by_pair(user_id, privileged).await? else {
            return Ok(MessageLimit::new(limit, limit));
        };

        let send_count = self.current_window(conversation, self.now()).await?;
        Ok(MessageLimit::new(limit, self.policy.remaining(send_count)))
    }

    /// Delete the conversation between an admin and `other_user_id`
    pub async fn delete_conversation(
        &self,
        requester_id: Uuid,
        requester_role: Role,
        other_user_id: Uuid,
    ) -> Result<(), BackendError> {
        if requester_role != Role::Admin {
            return Err(BackendError::forbidden("Not authorized as an admin"));
        }

        let conversation = self
            .conversations
            .find_by_pair(requester_id, other_user_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Conversation not found"))?;

        if !self.conversations.delete(conversation.id).await? {
            return Err(BackendError::not_found("Conversation not found"));
        }

        tracing::info!(
            "Conversation {} between {} and {} deleted",
            conversation.id,
            requester_id,
            other_user_id
        );
        Ok(())
    }

    /// Drop every conversation of a user who is being deleted
    pub async fn forget_user(&self, user_id: Uuid) -> Result<u64, BackendError> {
        Ok(self.conversations.delete_for_user(user_id).await?)
    }

    async fn find_or_open(
        &self,
        a: Uuid,
        b: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Conversation, BackendError> {
        if let Some(conversation) = self.conversations.find_by_pair(a, b).await? {
            return Ok(conversation);
        }
        Ok(self.conversations.create(Conversation::open(a, b, now)).await?)
    }

    /// Send count of the window that is current at `now`
    ///
    /// Resets the stored window first if it started on an earlier day.
    async fn current_window(
        &self,
        conversation: Conversation,
        now: DateTime<Utc>,
    ) -> Result<u32, BackendError> {
        if !self.policy.window_expired(conversation.reset_at, now) {
            return Ok(conversation.send_count);
        }

        if self
            .conversations
            .reset_window(conversation.id, conversation.reset_at, now)
            .await?
        {
            tracing::debug!("Quota window of conversation {} reset", conversation.id);
            return Ok(0);
        }

        // Someone else reset it first; read what they left
        let [a, b] = conversation.participants;
        Ok(self
            .conversations
            .find_by_pair(a, b)
            .await?
            .map(|c| c.send_count)
            .unwrap_or(0))
    }
}
