/**
 * Story HTTP Handlers
 *
 * Public:
 * - GET /api/stories - every story, most recently updated first
 * - GET /api/stories/hot, /recent, /search?q=
 * - GET /api/stories/{id}
 *
 * Authenticated:
 * - GET /api/stories/me/bookmarks
 * - POST /api/stories/check-title
 * - POST /api/stories - admins and contractors
 * - PUT, DELETE /api/stories/{id} - admins, the creator, or the creator's allies
 * - PUT /api/stories/{id}/volumes/{volume_id}/chapters/{chapter_id}/content
 * - PUT /api/stories/{id}/like, PUT /api/stories/{id}/bookmark, POST /api/stories/{id}/rate
 *
 * Every story in a response carries `creator: {id, username}`, or `null`
 * once the creating account is gone.
 */

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::auth::handlers::types::Availability;
use crate::backend::auth::users::{User, UserStore};
use crate::backend::error::{BackendError, StoreError};
use crate::backend::extract::Json;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::backend::stories::db::{last_updated_at, StoryFilter};
use crate::shared::story::{ChapterLookup, ContentBlock, RATING_RANGE};
use crate::shared::{Story, StoryInput};

/// How many stories `GET /api/stories/recent` returns
pub const RECENT_STORIES_LIMIT: u32 = 20;

/// Account that created a story
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatorRef {
    pub id: Uuid,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StoryResponse {
    #[serde(flatten)]
    pub story: Story,
    pub creator: Option<CreatorRef>,
}

impl StoryResponse {
    pub async fn load(users: &dyn UserStore, story: Story) -> Result<Self, BackendError> {
        let creator = match story.creator_id {
            Some(id) => users.find_by_id(id).await?.map(|user| CreatorRef {
                id: user.id,
                username: user.username,
            }),
            None => None,
        };
        Ok(Self { story, creator })
    }

    /// Resolve creators once per account rather than once per story
    pub async fn load_all(
        users: &dyn UserStore,
        stories: Vec<Story>,
    ) -> Result<Vec<Self>, BackendError> {
        let mut creators: HashMap<Uuid, Option<CreatorRef>> = HashMap::new();
        let mut responses = Vec::with_capacity(stories.len());

        for story in stories {
            let creator = match story.creator_id {
                Some(id) => {
                    if !creators.contains_key(&id) {
                        let found = users.find_by_id(id).await?.map(|user| CreatorRef {
                            id: user.id,
                            username: user.username,
                        });
                        creators.insert(id, found);
                    }
                    creators.get(&id).cloned().flatten()
                }
                None => None,
            };
            responses.push(Self { story, creator });
        }

        Ok(responses)
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CheckTitleRequest {
    pub title: Option<String>,
    pub exclude_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChapterContentRequest {
    pub content_blocks: Option<Vec<ContentBlock>>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct RateRequest {
    pub score: Option<f64>,
}

/// Malformed ids cannot name a story, so they are reported as missing
fn parse_story_id(raw: &str) -> Result<Uuid, BackendError> {
    raw.parse()
        .map_err(|_| BackendError::not_found("Story not found"))
}

async fn load_story(state: &AppState, raw_id: &str) -> Result<Story, BackendError> {
    let id = parse_story_id(raw_id)?;
    state
        .stories
        .find_by_id(id)
        .await?
        .ok_or_else(|| BackendError::not_found("Story not found"))
}

fn ensure_editable(story: &Story, user: &User, action: &str) -> Result<(), BackendError> {
    if story.editable_by(user.id, user.role, user.ally_of) {
        return Ok(());
    }
    tracing::warn!("{} may not {} story {}", user.username, action, story.id);
    Err(BackendError::forbidden(format!(
        "User not authorized to {action} this story"
    )))
}

fn title_conflict(err: StoreError) -> BackendError {
    match err {
        StoreError::Conflict(_) => BackendError::validation("Story title already exists"),
        other => other.into(),
    }
}

async fn respond(state: &AppState, story: Story) -> Result<Json<StoryResponse>, BackendError> {
    Ok(Json(StoryResponse::load(state.users.as_ref(), story).await?))
}

async fn respond_many(
    state: &AppState,
    filter: StoryFilter,
) -> Result<Json<Vec<StoryResponse>>, BackendError> {
    let stories = state.stories.list(filter).await?;
    Ok(Json(
        StoryResponse::load_all(state.users.as_ref(), stories).await?,
    ))
}

/// `GET /api/stories`
pub async fn list_stories(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoryResponse>>, BackendError> {
    respond_many(&state, StoryFilter::All).await
}

/// `GET /api/stories/hot`
pub async fn hot_stories(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoryResponse>>, BackendError> {
    respond_many(&state, StoryFilter::Hot).await
}

/// `GET /api/stories/recent`
pub async fn recent_stories(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoryResponse>>, BackendError> {
    respond_many(&state, StoryFilter::Recent(RECENT_STORIES_LIMIT)).await
}

/// `GET /api/stories/search?q=`
///
/// A blank query finds nothing.
pub async fn search_stories(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<StoryResponse>>, BackendError> {
    let query = params.q.unwrap_or_default();
    let query = query.trim();
    if query.is_empty() {
        return Ok(Json(Vec::new()));
    }
    respond_many(&state, StoryFilter::Search(query.to_string())).await
}

/// `GET /api/stories/me/bookmarks`
pub async fn bookmarked_stories(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<StoryResponse>>, BackendError> {
    respond_many(&state, StoryFilter::BookmarkedBy(user.id)).await
}

/// `GET /api/stories/{id}`
pub async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoryResponse>, BackendError> {
    let story = load_story(&state, &id).await?;
    respond(&state, story).await
}

/// `POST /api/stories/check-title`
///
/// `excludeId` leaves the story being edited out of the check.
pub async fn check_title(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(request): Json<CheckTitleRequest>,
) -> Result<Json<Availability>, BackendError> {
    let title = request
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| BackendError::validation("Title is required"))?;
    let exclude = request.exclude_id.and_then(|raw| raw.parse::<Uuid>().ok());

    let taken = state.stories.title_taken(&title, exclude).await?;
    Ok(Json(Availability { available: !taken }))
}

/// Create story handler
///
/// # Errors
///
/// * `403 Forbidden` - The caller is a standard user
/// * `400 Bad Request` - A required field is missing, or the title is taken
pub async fn create_story(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<StoryInput>,
) -> Result<(StatusCode, Json<StoryResponse>), BackendError> {
    if !user.role.is_staff() {
        tracing::warn!("User {} tried to create a story", user.username);
        return Err(BackendError::forbidden("User not authorized to create stories"));
    }

    let story = input.into_story(user.id, Utc::now())?;
    if state.stories.title_taken(&story.title, None).await? {
        return Err(BackendError::validation("Story title already exists"));
    }
    let created = state.stories.create(&story).await.map_err(title_conflict)?;

    tracing::info!("{} created story \"{}\"", user.username, created.title);
    let Json(response) = respond(&state, created).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Update story handler
///
/// Fields missing from the body keep their value. Any edit clears
/// `isRecent` and stamps `lastUpdated`.
///
/// # Errors
///
/// * `404 Not Found` - No such story
/// * `403 Forbidden` - The caller is not an admin, the creator, or an ally
/// * `400 Bad Request` - Blank or taken title
pub async fn update_story(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<StoryInput>,
) -> Result<Json<StoryResponse>, BackendError> {
    let mut story = load_story(&state, &id).await?;
    ensure_editable(&story, &user, "update")?;

    story.apply(input);
    if story.title.is_empty() {
        return Err(BackendError::validation("Title is required"));
    }
    let now = Utc::now();
    story.last_updated = last_updated_at(now);
    story.is_recent = false;

    let saved = state
        .stories
        .save(&story)
        .await
        .map_err(title_conflict)?
        .ok_or_else(|| BackendError::not_found("Story not found"))?;

    tracing::info!("{} updated story \"{}\"", user.username, saved.title);
    respond(&state, saved).await
}

/// Replace one chapter's content blocks
///
/// # Errors
///
/// * `404 Not Found` - No such story, volume or chapter
/// * `403 Forbidden` - The caller may not edit the story
/// * `400 Bad Request` - `contentBlocks` is missing
pub async fn update_chapter_content(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, volume_id, chapter_id)): Path<(String, String, String)>,
    Json(request): Json<ChapterContentRequest>,
) -> Result<Json<StoryResponse>, BackendError> {
    let mut story = load_story(&state, &id).await?;
    ensure_editable(&story, &user, "update")?;

    let volume_id = volume_id
        .parse::<Uuid>()
        .map_err(|_| BackendError::not_found("Volume not found"))?;
    let chapter_id = chapter_id
        .parse::<Uuid>()
        .map_err(|_| BackendError::not_found("Chapter not found"))?;
    let blocks = request
        .content_blocks
        .ok_or_else(|| BackendError::validation("contentBlocks is required"))?;

    match story.chapter_mut(volume_id, chapter_id) {
        ChapterLookup::Found(chapter) => chapter.content_blocks = blocks,
        ChapterLookup::NoVolume => return Err(BackendError::not_found("Volume not found")),
        ChapterLookup::NoChapter => return Err(BackendError::not_found("Chapter not found")),
    }
    story.last_updated = last_updated_at(Utc::now());

    let saved = state
        .stories
        .save(&story)
        .await?
        .ok_or_else(|| BackendError::not_found("Story not found"))?;
    respond(&state, saved).await
}

/// Delete story handler
///
/// The story's comments go with it.
pub async fn delete_story(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, BackendError> {
    let story = load_story(&state, &id).await?;
    ensure_editable(&story, &user, "delete")?;

    let comments = state.comments.delete_for_story(story.id).await?;
    if !state.stories.delete(story.id).await? {
        return Err(BackendError::not_found("Story not found"));
    }

    tracing::info!(
        "{} deleted story \"{}\" and {} comment(s)",
        user.username,
        story.title,
        comments
    );
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/stories/{id}/like`
pub async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<StoryResponse>, BackendError> {
    let id = parse_story_id(&id)?;
    let story = state
        .stories
        .toggle_like(id, user.id)
        .await?
        .ok_or_else(|| BackendError::not_found("Story not found"))?;
    respond(&state, story).await
}

/// `PUT /api/stories/{id}/bookmark`
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<StoryResponse>, BackendError> {
    let id = parse_story_id(&id)?;
    let story = state
        .stories
        .toggle_bookmark(id, user.id)
        .await?
        .ok_or_else(|| BackendError::not_found("Story not found"))?;
    respond(&state, story).await
}

/// Rate story handler
///
/// A second rating by the same user replaces the first.
///
/// # Errors
///
/// * `404 Not Found` - No such story (checked before the score)
/// * `400 Bad Request` - The score is not a whole number from 1 to 5
pub async fn rate_story(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<RateRequest>,
) -> Result<Json<StoryResponse>, BackendError> {
    let story = load_story(&state, &id).await?;

    let score = request
        .score
        .filter(|s| s.fract() == 0.0)
        .map(|s| s as u8)
        .filter(|s| RATING_RANGE.contains(s))
        .ok_or_else(|| BackendError::validation("Score must be between 1 and 5"))?;

    let rated = state
        .stories
        .rate(story.id, user.id, score)
        .await?
        .ok_or_else(|| BackendError::not_found("Story not found"))?;
    respond(&state, rated).await
}
