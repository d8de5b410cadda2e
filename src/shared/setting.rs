//! Site Settings
//!
//! Key/value pairs pointing at media (hero images, background music, …)
//! that the front end reads on start-up.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::SharedError;

/// Kind of media a setting points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            "audio" => Ok(MediaType::Audio),
            other => Err(SharedError::unknown_variant("media type", other)),
        }
    }
}

/// A stored setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub id: Uuid,
    pub key: String,
    pub value: String,
    pub media_type: MediaType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One item of the `PUT /api/settings` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingInput {
    pub key: String,
    pub value: String,
    pub media_type: MediaType,
}

impl SettingInput {
    /// Reject blank keys and values
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.key.trim().is_empty() {
            return Err(SharedError::validation("key", "Setting key cannot be empty"));
        }
        if self.value.trim().is_empty() {
            return Err(SharedError::validation(
                "value",
                format!("Setting '{}' must have a value", self.key),
            ));
        }
        Ok(())
    }
}
