//! Comment storage
//!
//! Deleting a comment removes its replies as well. Comments also go away
//! with their story and with their author's account.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::StoreError;
use crate::shared::Comment;

/// Comments written and likes received by one account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorActivity {
    pub comments: i64,
    pub likes_received: i64,
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Comments matching both filters when given, newest first
    async fn list(
        &self,
        story_id: Option<Uuid>,
        chapter_id: Option<&str>,
    ) -> Result<Vec<Comment>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, StoreError>;

    async fn create(&self, comment: &Comment) -> Result<Comment, StoreError>;

    /// Add or remove `user_id` from the comment's likes
    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Comment>, StoreError>;

    async fn toggle_pin(&self, id: Uuid) -> Result<Option<Comment>, StoreError>;

    /// Delete a comment and its replies. Returns `false` if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn delete_for_story(&self, story_id: Uuid) -> Result<u64, StoreError>;

    /// Delete everything `user_id` wrote, with replies, and their likes
    async fn forget_user(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Activity per author, for accounts with at least one comment
    async fn activity_by_author(&self) -> Result<HashMap<Uuid, AuthorActivity>, StoreError>;
}

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.story_id, c.chapter_id, c.user_id, c.text, c.parent_id, c.is_pinned,
           c.created_at, c.updated_at,
           ARRAY(SELECT l.user_id FROM comment_likes l
                 WHERE l.comment_id = c.id ORDER BY l.created_at, l.user_id) AS likes
    FROM comments c
"#;

fn comment_from_row(row: &PgRow) -> Result<Comment, StoreError> {
    let created_at: chrono::DateTime<Utc> = row.try_get("created_at")?;
    Ok(Comment {
        id: row.try_get("id")?,
        story_id: row.try_get("story_id")?,
        chapter_id: row.try_get("chapter_id")?,
        user_id: row.try_get("user_id")?,
        text: row.try_get("text")?,
        likes: row.try_get("likes")?,
        parent_id: row.try_get("parent_id")?,
        is_pinned: row.try_get("is_pinned")?,
        created_at,
        updated_at: row.try_get("updated_at")?,
        timestamp: created_at.timestamp_millis(),
    })
}

/// PostgreSQL-backed comment store
///
/// Replies, story deletion and account deletion are handled by the
/// schema's cascading foreign keys.
#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn list(
        &self,
        story_id: Option<Uuid>,
        chapter_id: Option<&str>,
    ) -> Result<Vec<Comment>, StoreError> {
        let sql = format!(
            r#"{COMMENT_SELECT}
            WHERE ($1::uuid IS NULL OR c.story_id = $1)
              AND ($2::text IS NULL OR c.chapter_id = $2)
            ORDER BY c.created_at DESC"#
        );
        let rows = sqlx::query(&sql)
            .bind(story_id)
            .bind(chapter_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(comment_from_row).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let sql = format!("{COMMENT_SELECT} WHERE c.id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn create(&self, comment: &Comment) -> Result<Comment, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, story_id, chapter_id, user_id, text, parent_id,
                                  is_pinned, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(comment.id)
        .bind(comment.story_id)
        .bind(&comment.chapter_id)
        .bind(comment.user_id)
        .bind(&comment.text)
        .bind(comment.parent_id)
        .bind(comment.is_pinned)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;

        self.find_by_id(comment.id)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Comment>, StoreError> {
        sqlx::query(
            r#"
            WITH removed AS (
                DELETE FROM comment_likes WHERE comment_id = $1 AND user_id = $2 RETURNING 1
            )
            INSERT INTO comment_likes (comment_id, user_id, created_at)
            SELECT $1, $2, $3
            WHERE NOT EXISTS (SELECT 1 FROM removed)
              AND EXISTS (SELECT 1 FROM comments WHERE id = $1)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await
    }

    async fn toggle_pin(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let result = sqlx::query(
            "UPDATE comments SET is_pinned = NOT is_pinned, updated_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_story(&self, story_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE story_id = $1")
            .bind(story_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn forget_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM comment_likes WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM comments WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn activity_by_author(&self) -> Result<HashMap<Uuid, AuthorActivity>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT c.user_id, COUNT(DISTINCT c.id) AS comments, COUNT(l.user_id) AS likes_received
            FROM comments c
            LEFT JOIN comment_likes l ON l.comment_id = c.id
            GROUP BY c.user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok((
                    row.try_get("user_id")?,
                    AuthorActivity {
                        comments: row.try_get("comments")?,
                        likes_received: row.try_get("likes_received")?,
                    },
                ))
            })
            .collect()
    }
}

/// In-process comment store
#[derive(Default)]
pub struct MemoryCommentStore {
    comments: RwLock<HashMap<Uuid, Comment>>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the matching comments and, transitively, their replies
    fn remove_where(
        comments: &mut HashMap<Uuid, Comment>,
        matches: impl Fn(&Comment) -> bool,
    ) -> u64 {
        let mut doomed: Vec<Uuid> = comments
            .values()
            .filter(|c| matches(c))
            .map(|c| c.id)
            .collect();
        let mut removed = 0;

        while let Some(id) = doomed.pop() {
            if comments.remove(&id).is_some() {
                removed += 1;
                doomed.extend(
                    comments
                        .values()
                        .filter(|c| c.parent_id == Some(id))
                        .map(|c| c.id),
                );
            }
        }
        removed
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn list(
        &self,
        story_id: Option<Uuid>,
        chapter_id: Option<&str>,
    ) -> Result<Vec<Comment>, StoreError> {
        let mut listed: Vec<Comment> = self
            .comments
            .read()
            .await
            .values()
            .filter(|c| story_id.map_or(true, |id| c.story_id == id))
            .filter(|c| chapter_id.map_or(true, |id| c.chapter_id.as_deref() == Some(id)))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        Ok(self.comments.read().await.get(&id).cloned())
    }

    async fn create(&self, comment: &Comment) -> Result<Comment, StoreError> {
        self.comments
            .write()
            .await
            .insert(comment.id, comment.clone());
        Ok(comment.clone())
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Comment>, StoreError> {
        let mut comments = self.comments.write().await;
        Ok(comments.get_mut(&id).map(|comment| {
            if let Some(pos) = comment.likes.iter().position(|u| *u == user_id) {
                comment.likes.remove(pos);
            } else {
                comment.likes.push(user_id);
            }
            comment.clone()
        }))
    }

    async fn toggle_pin(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let mut comments = self.comments.write().await;
        Ok(comments.get_mut(&id).map(|comment| {
            comment.is_pinned = !comment.is_pinned;
            comment.updated_at = Utc::now();
            comment.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut comments = self.comments.write().await;
        Ok(Self::remove_where(&mut comments, |c| c.id == id) > 0)
    }

    async fn delete_for_story(&self, story_id: Uuid) -> Result<u64, StoreError> {
        let mut comments = self.comments.write().await;
        Ok(Self::remove_where(&mut comments, |c| c.story_id == story_id))
    }

    async fn forget_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut comments = self.comments.write().await;
        for comment in comments.values_mut() {
            comment.likes.retain(|u| *u != user_id);
        }
        Ok(Self::remove_where(&mut comments, |c| c.user_id == user_id))
    }

    async fn activity_by_author(&self) -> Result<HashMap<Uuid, AuthorActivity>, StoreError> {
        let mut activity: HashMap<Uuid, AuthorActivity> = HashMap::new();
        for comment in self.comments.read().await.values() {
            let entry = activity.entry(comment.user_id).or_default();
            entry.comments += 1;
            entry.likes_received += comment.likes.len() as i64;
        }
        Ok(activity)
    }
}
