//! Story storage
//!
//! The content tree (volumes, chapters, blocks) is written as a whole with
//! `save`. Likes, bookmarks and ratings are per-user rows so that two
//! readers toggling at once never overwrite each other; they have their
//! own store operations and `save` leaves them untouched.
//!
//! Titles are unique without regard to case.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::StoreError;
use crate::shared::story::{Rating, Volume};
use crate::shared::{Story, StoryStatus};

/// Which stories `StoryStore::list` returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryFilter {
    /// Every story, most recently updated first
    All,
    /// Stories flagged hot, most recently updated first
    Hot,
    /// The newest stories by creation time, at most this many
    Recent(u32),
    /// Title, author or alternative title contains the text, ignoring case
    Search(String),
    /// Stories the user bookmarked, most recently updated first
    BookmarkedBy(Uuid),
}

#[async_trait]
pub trait StoryStore: Send + Sync {
    async fn list(&self, filter: StoryFilter) -> Result<Vec<Story>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Story>, StoreError>;

    /// Whether another story already uses `title` (case-insensitive)
    async fn title_taken(&self, title: &str, exclude: Option<Uuid>) -> Result<bool, StoreError>;

    /// Insert a new story. Fails with `StoreError::Conflict` on a taken title.
    async fn create(&self, story: &Story) -> Result<Story, StoreError>;

    /// Overwrite the content fields of `story` and bump `updated_at`
    ///
    /// Returns `None` if the story no longer exists.
    async fn save(&self, story: &Story) -> Result<Option<Story>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Add or remove `user_id` from the story's likes
    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Story>, StoreError>;

    /// Add or remove `user_id` from the story's bookmarks
    async fn toggle_bookmark(&self, id: Uuid, user_id: Uuid)
        -> Result<Option<Story>, StoreError>;

    /// Set the user's rating, replacing an earlier one
    async fn rate(&self, id: Uuid, user_id: Uuid, score: u8) -> Result<Option<Story>, StoreError>;

    /// Number of stories per creator
    async fn count_by_creator(&self) -> Result<HashMap<Uuid, i64>, StoreError>;

    /// Drop every trace of a deleted account
    ///
    /// Their stories stay, without a creator.
    async fn forget_user(&self, user_id: Uuid) -> Result<(), StoreError>;
}

const STORY_SELECT: &str = r#"
    SELECT s.id, s.creator_id, s.title, s.author, s.translator, s.alternative_titles,
           s.cover_image_url, s.genres, s.description, s.volumes, s.status, s.is_recent,
           s.hot, s.last_updated, s.rating, s.created_at, s.updated_at,
           ARRAY(SELECT l.user_id FROM story_likes l
                 WHERE l.story_id = s.id ORDER BY l.created_at, l.user_id) AS liked_by,
           ARRAY(SELECT b.user_id FROM story_bookmarks b
                 WHERE b.story_id = s.id ORDER BY b.created_at, b.user_id) AS bookmarks,
           COALESCE((SELECT jsonb_agg(jsonb_build_object('userId', r.user_id, 'score', r.score)
                                      ORDER BY r.created_at, r.user_id)
                     FROM story_ratings r WHERE r.story_id = s.id), '[]'::jsonb) AS ratings
    FROM stories s
"#;

fn story_from_row(row: &PgRow) -> Result<Story, StoreError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<StoryStatus>()
        .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))?;
    let Json(volumes): Json<Vec<Volume>> = row.try_get("volumes")?;
    let Json(ratings): Json<Vec<Rating>> = row.try_get("ratings")?;

    Ok(Story {
        id: row.try_get("id")?,
        creator_id: row.try_get("creator_id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        translator: row.try_get("translator")?,
        alternative_titles: row.try_get("alternative_titles")?,
        cover_image_url: row.try_get("cover_image_url")?,
        genres: row.try_get("genres")?,
        description: row.try_get("description")?,
        volumes,
        status,
        is_recent: row.try_get("is_recent")?,
        hot: row.try_get("hot")?,
        last_updated: row.try_get("last_updated")?,
        bookmarks: row.try_get("bookmarks")?,
        liked_by: row.try_get("liked_by")?,
        ratings,
        rating: row.try_get("rating")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Escape `%`, `_` and `\` so user text matches literally inside `ILIKE`
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// PostgreSQL-backed story store
#[derive(Clone)]
pub struct PgStoryStore {
    pool: PgPool,
}

impl PgStoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add the pair to `table` if absent, remove it if present
    async fn toggle_membership(
        &self,
        table: &'static str,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Story>, StoreError> {
        let sql = format!(
            r#"
            WITH removed AS (
                DELETE FROM {table} WHERE story_id = $1 AND user_id = $2 RETURNING 1
            )
            INSERT INTO {table} (story_id, user_id, created_at)
            SELECT $1, $2, $3
            WHERE NOT EXISTS (SELECT 1 FROM removed)
              AND EXISTS (SELECT 1 FROM stories WHERE id = $1)
            ON CONFLICT DO NOTHING
            "#
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        self.find_by_id(id).await
    }
}

#[async_trait]
impl StoryStore for PgStoryStore {
    async fn list(&self, filter: StoryFilter) -> Result<Vec<Story>, StoreError> {
        let rows = match filter {
            StoryFilter::All => {
                let sql = format!("{STORY_SELECT} ORDER BY s.last_updated DESC");
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
            StoryFilter::Hot => {
                let sql = format!("{STORY_SELECT} WHERE s.hot ORDER BY s.last_updated DESC");
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
            StoryFilter::Recent(limit) => {
                let sql = format!("{STORY_SELECT} ORDER BY s.created_at DESC LIMIT $1");
                sqlx::query(&sql)
                    .bind(i64::from(limit))
                    .fetch_all(&self.pool)
                    .await?
            }
            StoryFilter::Search(text) => {
                let sql = format!(
                    r#"{STORY_SELECT}
                    WHERE s.title ILIKE $1
                       OR s.author ILIKE $1
                       OR EXISTS (SELECT 1 FROM unnest(s.alternative_titles) AS alt WHERE alt ILIKE $1)
                    ORDER BY s.last_updated DESC"#
                );
                sqlx::query(&sql)
                    .bind(like_pattern(&text))
                    .fetch_all(&self.pool)
                    .await?
            }
            StoryFilter::BookmarkedBy(user_id) => {
                let sql = format!(
                    r#"{STORY_SELECT}
                    WHERE EXISTS (SELECT 1 FROM story_bookmarks b
                                  WHERE b.story_id = s.id AND b.user_id = $1)
                    ORDER BY s.last_updated DESC"#
                );
                sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?
            }
        };

        rows.iter().map(story_from_row).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Story>, StoreError> {
        let sql = format!("{STORY_SELECT} WHERE s.id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(story_from_row).transpose()
    }

    async fn title_taken(&self, title: &str, exclude: Option<Uuid>) -> Result<bool, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM stories
                WHERE LOWER(title) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2)
            ) AS taken
            "#,
        )
        .bind(title.trim())
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("taken")?)
    }

    async fn create(&self, story: &Story) -> Result<Story, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO stories (id, creator_id, title, author, translator, alternative_titles,
                                 cover_image_url, genres, description, volumes, status,
                                 is_recent, hot, last_updated, rating, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(story.id)
        .bind(story.creator_id)
        .bind(&story.title)
        .bind(&story.author)
        .bind(&story.translator)
        .bind(&story.alternative_titles)
        .bind(&story.cover_image_url)
        .bind(&story.genres)
        .bind(&story.description)
        .bind(Json(&story.volumes))
        .bind(story.status.as_str())
        .bind(story.is_recent)
        .bind(story.hot)
        .bind(story.last_updated)
        .bind(story.rating)
        .bind(story.created_at)
        .bind(story.updated_at)
        .execute(&self.pool)
        .await?;

        self.find_by_id(story.id)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn save(&self, story: &Story) -> Result<Option<Story>, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE stories
            SET title = $2, author = $3, translator = $4, alternative_titles = $5,
                cover_image_url = $6, genres = $7, description = $8, volumes = $9,
                status = $10, is_recent = $11, hot = $12, last_updated = $13,
                rating = $14, updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(story.id)
        .bind(&story.title)
        .bind(&story.author)
        .bind(&story.translator)
        .bind(&story.alternative_titles)
        .bind(&story.cover_image_url)
        .bind(&story.genres)
        .bind(&story.description)
        .bind(Json(&story.volumes))
        .bind(story.status.as_str())
        .bind(story.is_recent)
        .bind(story.hot)
        .bind(story.last_updated)
        .bind(story.rating)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(story.id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Story>, StoreError> {
        self.toggle_membership("story_likes", id, user_id).await
    }

    async fn toggle_bookmark(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Story>, StoreError> {
        self.toggle_membership("story_bookmarks", id, user_id).await
    }

    async fn rate(&self, id: Uuid, user_id: Uuid, score: u8) -> Result<Option<Story>, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO story_ratings (story_id, user_id, score, created_at)
            SELECT $1, $2, $3, $4
            WHERE EXISTS (SELECT 1 FROM stories WHERE id = $1)
            ON CONFLICT (story_id, user_id) DO UPDATE SET score = EXCLUDED.score
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(i16::from(score))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await
    }

    async fn count_by_creator(&self) -> Result<HashMap<Uuid, i64>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT creator_id, COUNT(*) AS stories
            FROM stories
            WHERE creator_id IS NOT NULL
            GROUP BY creator_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok((row.try_get("creator_id")?, row.try_get("stories")?)))
            .collect()
    }

    async fn forget_user(&self, user_id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for sql in [
            "DELETE FROM story_likes WHERE user_id = $1",
            "DELETE FROM story_bookmarks WHERE user_id = $1",
            "DELETE FROM story_ratings WHERE user_id = $1",
            "UPDATE stories SET creator_id = NULL WHERE creator_id = $1",
        ] {
            sqlx::query(sql).bind(user_id).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

/// In-process story store
#[derive(Default)]
pub struct MemoryStoryStore {
    stories: RwLock<HashMap<Uuid, Story>>,
}

impl MemoryStoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn title_conflict(stories: &HashMap<Uuid, Story>, title: &str, exclude: Option<Uuid>) -> bool {
        let title = title.trim().to_lowercase();
        stories
            .values()
            .any(|s| Some(s.id) != exclude && s.title.to_lowercase() == title)
    }

    fn by_last_updated(mut stories: Vec<Story>) -> Vec<Story> {
        stories.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        stories
    }

    async fn update_with(
        &self,
        id: Uuid,
        change: impl FnOnce(&mut Story) + Send,
    ) -> Result<Option<Story>, StoreError> {
        let mut stories = self.stories.write().await;
        Ok(stories.get_mut(&id).map(|story| {
            change(story);
            story.clone()
        }))
    }
}

fn toggle(members: &mut Vec<Uuid>, user_id: Uuid) {
    if let Some(pos) = members.iter().position(|m| *m == user_id) {
        members.remove(pos);
    } else {
        members.push(user_id);
    }
}

#[async_trait]
impl StoryStore for MemoryStoryStore {
    async fn list(&self, filter: StoryFilter) -> Result<Vec<Story>, StoreError> {
        let stories = self.stories.read().await;
        let all = stories.values().cloned();

        let listed = match filter {
            StoryFilter::All => Self::by_last_updated(all.collect()),
            StoryFilter::Hot => Self::by_last_updated(all.filter(|s| s.hot).collect()),
            StoryFilter::Recent(limit) => {
                let mut recent: Vec<Story> = all.collect();
                recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                recent.truncate(limit as usize);
                recent
            }
            StoryFilter::Search(text) => {
                let needle = text.to_lowercase();
                let hit = |s: &Story| {
                    s.title.to_lowercase().contains(&needle)
                        || s.author.to_lowercase().contains(&needle)
                        || s.alternative_titles
                            .iter()
                            .any(|alt| alt.to_lowercase().contains(&needle))
                };
                Self::by_last_updated(all.filter(|s| hit(s)).collect())
            }
            StoryFilter::BookmarkedBy(user_id) => {
                Self::by_last_updated(all.filter(|s| s.bookmarks.contains(&user_id)).collect())
            }
        };
        Ok(listed)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Story>, StoreError> {
        Ok(self.stories.read().await.get(&id).cloned())
    }

    async fn title_taken(&self, title: &str, exclude: Option<Uuid>) -> Result<bool, StoreError> {
        let stories = self.stories.read().await;
        Ok(Self::title_conflict(&stories, title, exclude))
    }

    async fn create(&self, story: &Story) -> Result<Story, StoreError> {
        let mut stories = self.stories.write().await;
        if Self::title_conflict(&stories, &story.title, None) {
            return Err(StoreError::Conflict("stories_title_key".to_string()));
        }
        stories.insert(story.id, story.clone());
        Ok(story.clone())
    }

    async fn save(&self, story: &Story) -> Result<Option<Story>, StoreError> {
        let mut stories = self.stories.write().await;
        if Self::title_conflict(&stories, &story.title, Some(story.id)) {
            return Err(StoreError::Conflict("stories_title_key".to_string()));
        }
        let Some(stored) = stories.get_mut(&story.id) else {
            return Ok(None);
        };

        let mut updated = story.clone();
        updated.creator_id = stored.creator_id;
        updated.liked_by = std::mem::take(&mut stored.liked_by);
        updated.bookmarks = std::mem::take(&mut stored.bookmarks);
        updated.ratings = std::mem::take(&mut stored.ratings);
        updated.created_at = stored.created_at;
        updated.updated_at = Utc::now();
        *stored = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.stories.write().await.remove(&id).is_some())
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Story>, StoreError> {
        self.update_with(id, |story| toggle(&mut story.liked_by, user_id))
            .await
    }

    async fn toggle_bookmark(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Story>, StoreError> {
        self.update_with(id, |story| toggle(&mut story.bookmarks, user_id))
            .await
    }

    async fn rate(&self, id: Uuid, user_id: Uuid, score: u8) -> Result<Option<Story>, StoreError> {
        self.update_with(id, |story| {
            match story.ratings.iter_mut().find(|r| r.user_id == user_id) {
                Some(existing) => existing.score = score,
                None => story.ratings.push(Rating { user_id, score }),
            }
        })
        .await
    }

    async fn count_by_creator(&self) -> Result<HashMap<Uuid, i64>, StoreError> {
        let mut counts = HashMap::new();
        for creator in self.stories.read().await.values().filter_map(|s| s.creator_id) {
            *counts.entry(creator).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn forget_user(&self, user_id: Uuid) -> Result<(), StoreError> {
        for story in self.stories.write().await.values_mut() {
            story.liked_by.retain(|id| *id != user_id);
            story.bookmarks.retain(|id| *id != user_id);
            story.ratings.retain(|r| r.user_id != user_id);
            if story.creator_id == Some(user_id) {
                story.creator_id = None;
            }
        }
        Ok(())
    }
}

/// Stamp for `Story::last_updated`
pub fn last_updated_at(now: DateTime<Utc>) -> i64 {
    now.timestamp_millis()
}
