//! Story Comments
//!
//! A comment belongs to a story and optionally to one chapter of it.
//! Replies point at their parent through `parent_id`; deleting a comment
//! deletes its direct replies too.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::SharedError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub story_id: Uuid,
    /// Chapter ids live inside the story document, so this is not checked
    pub chapter_id: Option<String>,
    /// Author
    pub user_id: Uuid,
    pub text: String,
    /// Users who liked the comment
    pub likes: Vec<Uuid>,
    pub parent_id: Option<Uuid>,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `created_at` as Unix epoch milliseconds
    pub timestamp: i64,
}

impl Comment {
    pub fn new(
        story_id: Uuid,
        chapter_id: Option<String>,
        user_id: Uuid,
        text: impl Into<String>,
        parent_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            story_id,
            chapter_id,
            user_id,
            text: text.into(),
            likes: Vec::new(),
            parent_id,
            is_pinned: false,
            created_at,
            updated_at: created_at,
            timestamp: created_at.timestamp_millis(),
        }
    }
}

/// Body of `POST /api/comments`
///
/// Ids arrive as strings; an empty `parentId` means a top-level comment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCommentRequest {
    pub story_id: Option<String>,
    pub chapter_id: Option<String>,
    pub text: Option<String>,
    pub parent_id: Option<String>,
}

/// Validated comment fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub story_id: Uuid,
    pub chapter_id: Option<String>,
    pub text: String,
    pub parent_id: Option<Uuid>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CreateCommentRequest {
    /// Check required fields and parse ids
    pub fn validate(self) -> Result<NewComment, SharedError> {
        let (Some(text), Some(story_id)) = (
            self.text.filter(|t| !t.trim().is_empty()),
            blank_to_none(self.story_id),
        ) else {
            return Err(SharedError::validation(
                "text",
                "Text and storyId are required",
            ));
        };

        let story_id = story_id
            .parse::<Uuid>()
            .map_err(|_| SharedError::validation("storyId", format!("Invalid story id: {story_id}")))?;

        let parent_id = match blank_to_none(self.parent_id) {
            Some(raw) => Some(raw.parse::<Uuid>().map_err(|_| {
                SharedError::validation("parentId", format!("Invalid comment id: {raw}"))
            })?),
            None => None,
        };

        Ok(NewComment {
            story_id,
            chapter_id: blank_to_none(self.chapter_id),
            text,
            parent_id,
        })
    }
}
