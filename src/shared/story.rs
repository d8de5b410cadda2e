//! Story Catalog Types
//!
//! A story owns its volumes, a volume owns its chapters, and a chapter owns
//! its content blocks. Volumes, chapters and blocks are addressed by ids
//! that are unique inside their story; clients may omit them when creating
//! and a fresh id is assigned.
//!
//! Likes, bookmarks and ratings are lists of user ids kept on the story.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::SharedError;
use super::user::Role;

/// Publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StoryStatus {
    #[default]
    Ongoing,
    Completed,
    Dropped,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Ongoing => "Ongoing",
            StoryStatus::Completed => "Completed",
            StoryStatus::Dropped => "Dropped",
        }
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ongoing" => Ok(StoryStatus::Ongoing),
            "Completed" => Ok(StoryStatus::Completed),
            "Dropped" => Ok(StoryStatus::Dropped),
            other => Err(SharedError::unknown_variant("story status", other)),
        }
    }
}

/// What a content block holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image,
}

/// One paragraph or picture of a chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Text, or the image URL
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content_blocks: Vec<ContentBlock>,
    /// Epoch milliseconds of publication
    #[serde(default = "now_millis")]
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

/// A user's 1-5 score for a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user_id: Uuid,
    pub score: u8,
}

/// Lowest and highest accepted rating
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// A story with its full content tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: Uuid,
    /// Contractor or admin who created the story; `None` once that account is gone
    pub creator_id: Option<Uuid>,
    pub title: String,
    pub author: String,
    pub translator: Option<String>,
    pub alternative_titles: Vec<String>,
    pub cover_image_url: String,
    pub genres: Vec<String>,
    pub description: String,
    pub volumes: Vec<Volume>,
    pub status: StoryStatus,
    /// Set on creation, cleared by the first edit
    pub is_recent: bool,
    pub hot: bool,
    /// Epoch milliseconds of the last content change
    pub last_updated: i64,
    pub bookmarks: Vec<Uuid>,
    pub liked_by: Vec<Uuid>,
    pub ratings: Vec<Rating>,
    /// Legacy editorial rating; `ratings` is the source of truth
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    /// Mean of all user ratings
    pub fn average_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let total: u32 = self.ratings.iter().map(|r| u32::from(r.score)).sum();
        Some(f64::from(total) / self.ratings.len() as f64)
    }

    /// Whether a user may edit or delete this story
    ///
    /// Admins may edit anything; otherwise the caller must be the creator or
    /// one of the creator's allies.
    pub fn editable_by(&self, user_id: Uuid, role: Role, ally_of: Option<Uuid>) -> bool {
        if role == Role::Admin {
            return true;
        }
        match self.creator_id {
            Some(creator) => creator == user_id || ally_of == Some(creator),
            None => false,
        }
    }

    pub fn chapter_mut(&mut self, volume_id: Uuid, chapter_id: Uuid) -> ChapterLookup<'_> {
        let Some(volume) = self.volumes.iter_mut().find(|v| v.id == volume_id) else {
            return ChapterLookup::NoVolume;
        };
        match volume.chapters.iter_mut().find(|c| c.id == chapter_id) {
            Some(chapter) => ChapterLookup::Found(chapter),
            None => ChapterLookup::NoChapter,
        }
    }

    /// Overwrite every field `input` carries; absent fields keep their value
    pub fn apply(&mut self, input: StoryInput) {
        let StoryInput {
            title,
            author,
            translator,
            alternative_titles,
            cover_image_url,
            genres,
            description,
            volumes,
            status,
            hot,
            rating,
        } = input;

        if let Some(title) = title {
            self.title = title.trim().to_string();
        }
        if let Some(author) = author {
            self.author = author;
        }
        if translator.is_some() {
            self.translator = translator;
        }
        if let Some(alternative_titles) = alternative_titles {
            self.alternative_titles = alternative_titles;
        }
        if let Some(cover_image_url) = cover_image_url {
            self.cover_image_url = cover_image_url;
        }
        if let Some(genres) = genres {
            self.genres = genres;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(volumes) = volumes {
            self.volumes = volumes;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(hot) = hot {
            self.hot = hot;
        }
        if rating.is_some() {
            self.rating = rating;
        }
    }
}

/// Result of looking a chapter up by volume and chapter id
#[derive(Debug)]
pub enum ChapterLookup<'a> {
    Found(&'a mut Chapter),
    NoVolume,
    NoChapter,
}

/// Body of `POST /api/stories` and `PUT /api/stories/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub translator: Option<String>,
    pub alternative_titles: Option<Vec<String>>,
    pub cover_image_url: Option<String>,
    pub genres: Option<Vec<String>>,
    pub description: Option<String>,
    pub volumes: Option<Vec<Volume>>,
    pub status: Option<StoryStatus>,
    pub hot: Option<bool>,
    pub rating: Option<f64>,
}

fn required(value: Option<String>, field: &str) -> Result<String, SharedError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SharedError::validation(field, format!("{field} is required")))
}

impl StoryInput {
    /// Build a new story created by `creator_id`
    ///
    /// Title, author, cover image, genres and description are required.
    pub fn into_story(self, creator_id: Uuid, now: DateTime<Utc>) -> Result<Story, SharedError> {
        let title = required(self.title, "title")?;
        let author = required(self.author, "author")?;
        let cover_image_url = required(self.cover_image_url, "coverImageUrl")?;
        let description = required(self.description, "description")?;
        let genres = self
            .genres
            .ok_or_else(|| SharedError::validation("genres", "genres is required"))?;

        Ok(Story {
            id: Uuid::new_v4(),
            creator_id: Some(creator_id),
            title,
            author,
            translator: self.translator,
            alternative_titles: self.alternative_titles.unwrap_or_default(),
            cover_image_url,
            genres,
            description,
            volumes: self.volumes.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            is_recent: true,
            hot: self.hot.unwrap_or(false),
            last_updated: now.timestamp_millis(),
            bookmarks: Vec::new(),
            liked_by: Vec::new(),
            ratings: Vec::new(),
            rating: self.rating,
            created_at: now,
            updated_at: now,
        })
    }
}
