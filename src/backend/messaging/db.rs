//! Conversation storage
//!
//! Conversations and their messages live behind `ConversationStore`. The
//! store owns the atomicity rules the gateway relies on:
//!
//! - at most one conversation per unordered participant pair (`create`
//!   returns the existing one when it loses a race)
//! - `append_message` increments the quota counter and appends the message
//!   as one unit, and only while the counter is below the limit
//! - `reset_window` only fires if nobody reset the window first
//! - `delete` removes a conversation together with all its messages

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backend::error::StoreError;
use crate::shared::messaging::{pair_key, Conversation, DirectMessage};

/// Result of `ConversationStore::append_message`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The message was stored; `send_count` is the counter after the append
    Appended { send_count: u32 },
    /// The counter already reached the limit; nothing was stored
    LimitReached,
    /// The conversation no longer exists
    Missing,
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Conversation between `a` and `b`, in either order
    async fn find_by_pair(&self, a: Uuid, b: Uuid) -> Result<Option<Conversation>, StoreError>;

    /// Insert a new conversation
    ///
    /// If one already exists for the same pair, that one is returned instead.
    async fn create(&self, conversation: Conversation) -> Result<Conversation, StoreError>;

    /// Every conversation `user_id` takes part in, most recently updated first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, StoreError>;

    /// Start a new quota window at `now`
    ///
    /// Only applies if the stored window still starts at `observed`; returns
    /// whether this call performed the reset.
    async fn reset_window(
        &self,
        id: Uuid,
        observed: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Append `message`
    ///
    /// With `limit: Some(n)` the counter is incremented in the same unit and
    /// the append is refused once the counter has reached `n`. With `None`
    /// the counter is left alone.
    async fn append_message(
        &self,
        id: Uuid,
        message: &DirectMessage,
        limit: Option<u32>,
    ) -> Result<AppendOutcome, StoreError>;

    /// Mark every message addressed to `receiver_id` as read
    ///
    /// Returns how many messages changed.
    async fn mark_read(
        &self,
        id: Uuid,
        receiver_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Delete a conversation and all its messages
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Delete every conversation `user_id` takes part in
    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError>;
}

fn count_from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn count_to_db(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// PostgreSQL-backed conversation store
#[derive(Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn conversation_from_row(row: &PgRow) -> Result<Conversation, StoreError> {
        Ok(Conversation {
            id: row.try_get("id")?,
            participants: [row.try_get("participant_a")?, row.try_get("participant_b")?],
            messages: Vec::new(),
            send_count: count_from_db(row.try_get("send_count")?),
            reset_at: row.try_get("reset_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn message_from_row(row: &PgRow) -> Result<(Uuid, DirectMessage), StoreError> {
        let conversation_id: Uuid = row.try_get("conversation_id")?;
        let message = DirectMessage::restore(
            row.try_get("id")?,
            row.try_get("sender_id")?,
            row.try_get("receiver_id")?,
            row.try_get::<String, _>("text")?,
            row.try_get("is_read")?,
            row.try_get("created_at")?,
        );
        Ok((conversation_id, message))
    }

    /// Load the messages of `conversations` and attach them in order
    async fn with_messages(
        &self,
        mut conversations: Vec<Conversation>,
    ) -> Result<Vec<Conversation>, StoreError> {
        if conversations.is_empty() {
            return Ok(conversations);
        }

        let ids: Vec<Uuid> = conversations.iter().map(|c| c.id).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, receiver_id, text, is_read, created_at
            FROM direct_messages
            WHERE conversation_id = ANY($1)
            ORDER BY seq ASC
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<DirectMessage>> = HashMap::new();
        for row in &rows {
            let (conversation_id, message) = Self::message_from_row(row)?;
            grouped.entry(conversation_id).or_default().push(message);
        }

        for conversation in &mut conversations {
            conversation.messages = grouped.remove(&conversation.id).unwrap_or_default();
        }
        Ok(conversations)
    }
}

const CONVERSATION_COLUMNS: &str =
    "id, participant_a, participant_b, send_count, reset_at, created_at, updated_at";

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn find_by_pair(&self, a: Uuid, b: Uuid) -> Result<Option<Conversation>, StoreError> {
        let (low, high) = pair_key(a, b);
        let sql = format!(
            r#"
            SELECT {CONVERSATION_COLUMNS}
            FROM conversations
            WHERE LEAST(participant_a, participant_b) = $1
              AND GREATEST(participant_a, participant_b) = $2
            "#
        );
        let row = sqlx::query(&sql)
            .bind(low)
            .bind(high)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let conversation = Self::conversation_from_row(&row)?;
        Ok(self.with_messages(vec![conversation]).await?.pop())
    }

    async fn create(&self, conversation: Conversation) -> Result<Conversation, StoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO conversations
                (id, participant_a, participant_b, send_count, reset_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(conversation.id)
        .bind(conversation.participants[0])
        .bind(conversation.participants[1])
        .bind(count_to_db(conversation.send_count))
        .bind(conversation.reset_at)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            return Ok(conversation);
        }

        tracing::debug!("Conversation for pair already exists, reusing it");
        let [a, b] = conversation.participants;
        self.find_by_pair(a, b)
            .await?
            .ok_or_else(|| StoreError::Conflict("conversations_pair_key".to_string()))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, StoreError> {
        let sql = format!(
            r#"
            SELECT {CONVERSATION_COLUMNS}
            FROM conversations
            WHERE participant_a = $1 OR participant_b = $1
            ORDER BY updated_at DESC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let conversations = rows
            .iter()
            .map(Self::conversation_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        self.with_messages(conversations).await
    }

    async fn reset_window(
        &self,
        id: Uuid,
        observed: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET send_count = 0, reset_at = $3, updated_at = $3
            WHERE id = $1 AND reset_at = $2
            "#,
        )
        .bind(id)
        .bind(observed)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_message(
        &self,
        id: Uuid,
        message: &DirectMessage,
        limit: Option<u32>,
    ) -> Result<AppendOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // The row lock taken here serialises concurrent sends on this conversation
        let counted = match limit {
            Some(limit) => sqlx::query(
                r#"
                UPDATE conversations
                SET send_count = send_count + 1, updated_at = $3
                WHERE id = $1 AND send_count < $2
                RETURNING send_count
                "#,
            )
            .bind(id)
            .bind(count_to_db(limit))
            .bind(message.created_at)
            .fetch_optional(&mut *tx)
            .await?,
            None => sqlx::query(
                r#"
                UPDATE conversations
                SET updated_at = $2
                WHERE id = $1
                RETURNING send_count
                "#,
            )
            .bind(id)
            .bind(message.created_at)
            .fetch_optional(&mut *tx)
            .await?,
        };

        let Some(row) = counted else {
            let exists = sqlx::query("SELECT 1 FROM conversations WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
            tx.rollback().await?;
            return Ok(if exists {
                AppendOutcome::LimitReached
            } else {
                AppendOutcome::Missing
            });
        };
        let send_count = count_from_db(row.try_get("send_count")?);

        sqlx::query(
            r#"
            INSERT INTO direct_messages
                (id, conversation_id, sender_id, receiver_id, text, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id)
        .bind(id)
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.text)
        .bind(message.is_read)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(AppendOutcome::Appended { send_count })
    }

    async fn mark_read(
        &self,
        id: Uuid,
        receiver_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let changed = sqlx::query(
            r#"
            UPDATE direct_messages
            SET is_read = TRUE
            WHERE conversation_id = $1 AND receiver_id = $2 AND NOT is_read
            "#,
        )
        .bind(id)
        .bind(receiver_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if changed > 0 {
            sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
                .bind(id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(changed)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        // direct_messages rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result =
            sqlx::query("DELETE FROM conversations WHERE participant_a = $1 OR participant_b = $1")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Default)]
struct MemoryConversations {
    by_id: HashMap<Uuid, Conversation>,
    by_pair: HashMap<(Uuid, Uuid), Uuid>,
}

impl MemoryConversations {
    fn remove(&mut self, id: Uuid) -> bool {
        match self.by_id.remove(&id) {
            Some(conversation) => {
                self.by_pair.remove(&conversation.key());
                true
            }
            None => false,
        }
    }
}

/// In-process conversation store
///
/// Every operation runs under one lock, which gives it the same atomicity
/// as the PostgreSQL transactions.
#[derive(Default)]
pub struct MemoryConversationStore {
    inner: Mutex<MemoryConversations>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn find_by_pair(&self, a: Uuid, b: Uuid) -> Result<Option<Conversation>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .by_pair
            .get(&pair_key(a, b))
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn create(&self, conversation: Conversation) -> Result<Conversation, StoreError> {
        let mut inner = self.inner.lock().await;
        let key = conversation.key();
        if let Some(existing) = inner.by_pair.get(&key).and_then(|id| inner.by_id.get(id)) {
            return Ok(existing.clone());
        }
        inner.by_pair.insert(key, conversation.id);
        inner.by_id.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, StoreError> {
        let inner = self.inner.lock().await;
        let mut conversations: Vec<Conversation> = inner
            .by_id
            .values()
            .filter(|c| c.has_participant(user_id))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn reset_window(
        &self,
        id: Uuid,
        observed: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.by_id.get_mut(&id) {
            Some(conversation) if conversation.reset_at == observed => {
                conversation.send_count = 0;
                conversation.reset_at = now;
                conversation.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_message(
        &self,
        id: Uuid,
        message: &DirectMessage,
        limit: Option<u32>,
    ) -> Result<AppendOutcome, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(conversation) = inner.by_id.get_mut(&id) else {
            return Ok(AppendOutcome::Missing);
        };

        if let Some(limit) = limit {
            if conversation.send_count >= limit {
                return Ok(AppendOutcome::LimitReached);
            }
            conversation.send_count += 1;
        }
        conversation.messages.push(message.clone());
        conversation.updated_at = message.created_at;

        Ok(AppendOutcome::Appended {
            send_count: conversation.send_count,
        })
    }

    async fn mark_read(
        &self,
        id: Uuid,
        receiver_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(conversation) = inner.by_id.get_mut(&id) else {
            return Ok(0);
        };

        let changed = conversation.mark_read_for(receiver_id);
        if changed > 0 {
            conversation.updated_at = now;
        }
        Ok(changed as u64)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.remove(id))
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let doomed: Vec<Uuid> = inner
            .by_id
            .values()
            .filter(|c| c.has_participant(user_id))
            .map(|c| c.id)
            .collect();

        let mut removed = 0;
        for id in doomed {
            if inner.remove(id) {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
