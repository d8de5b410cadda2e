//! `GET /api/users/leaderboard`
//!
//! Ten most active accounts. A story created is worth 10 points, a like
//! received on a comment 2, and a comment written 1. Accounts with no
//! points are left out.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::backend::auth::handlers::types::PublicUser;
use crate::backend::error::BackendError;
use crate::backend::extract::Json;
use crate::backend::server::state::AppState;

pub const LEADERBOARD_SIZE: usize = 10;

const STORY_POINTS: i64 = 10;
const LIKE_POINTS: i64 = 2;
const COMMENT_POINTS: i64 = 1;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(flatten)]
    pub user: PublicUser,
    pub total_score: i64,
}

pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, BackendError> {
    let users = state.users.list().await?;
    let stories = state.stories.count_by_creator().await?;
    let activity = state.comments.activity_by_author().await?;

    let mut entries: Vec<LeaderboardEntry> = users
        .into_iter()
        .map(|user| {
            let created = stories.get(&user.id).copied().unwrap_or(0);
            let active = activity.get(&user.id).copied().unwrap_or_default();
            let total_score = created * STORY_POINTS
                + active.likes_received * LIKE_POINTS
                + active.comments * COMMENT_POINTS;
            LeaderboardEntry {
                user: PublicUser::from(user),
                total_score,
            }
        })
        .filter(|entry| entry.total_score > 0)
        .collect();

    // Stable sort keeps older accounts first on ties
    entries.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    entries.truncate(LEADERBOARD_SIZE);

    Ok(Json(entries))
}
