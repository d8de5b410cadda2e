//! Comment HTTP Handlers
//!
//! - `GET /api/comments?storyId=&chapterId=` - public
//! - `POST /api/comments` - authenticated
//! - `PUT /api/comments/{id}/like` - authenticated
//! - `PUT /api/comments/{id}/pin` - admin
//! - `DELETE /api/comments/{id}` - the author or an admin
//!
//! Comments are returned with their author under `user`.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::auth::handlers::types::PublicUser;
use crate::backend::auth::users::UserStore;
use crate::backend::error::BackendError;
use crate::backend::extract::Json;
use crate::backend::middleware::{AdminUser, AuthUser};
use crate::backend::server::state::AppState;
use crate::shared::{Comment, CreateCommentRequest, Role, SharedError};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommentResponse {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: Option<PublicUser>,
}

impl CommentResponse {
    pub async fn load(users: &dyn UserStore, comment: Comment) -> Result<Self, BackendError> {
        let user = users.find_by_id(comment.user_id).await?.map(PublicUser::from);
        Ok(Self { comment, user })
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentFilter {
    pub story_id: Option<String>,
    pub chapter_id: Option<String>,
}

fn parse_comment_id(raw: &str) -> Result<Uuid, BackendError> {
    raw.parse()
        .map_err(|_| BackendError::not_found("Comment not found"))
}

async fn respond(state: &AppState, comment: Comment) -> Result<Json<CommentResponse>, BackendError> {
    Ok(Json(CommentResponse::load(state.users.as_ref(), comment).await?))
}

/// `GET /api/comments`
///
/// A `storyId` that is not a valid id matches nothing.
pub async fn list_comments(
    State(state): State<AppState>,
    Query(filter): Query<CommentFilter>,
) -> Result<Json<Vec<CommentResponse>>, BackendError> {
    let story_id = match filter.story_id.filter(|s| !s.is_empty()) {
        Some(raw) => match raw.parse::<Uuid>() {
            Ok(id) => Some(id),
            Err(_) => return Ok(Json(Vec::new())),
        },
        None => None,
    };
    let chapter_id = filter.chapter_id.filter(|c| !c.is_empty());

    let comments = state.comments.list(story_id, chapter_id.as_deref()).await?;

    let mut authors: HashMap<Uuid, Option<PublicUser>> = HashMap::new();
    let mut responses = Vec::with_capacity(comments.len());
    for comment in comments {
        if !authors.contains_key(&comment.user_id) {
            let author = state.users.find_by_id(comment.user_id).await?.map(PublicUser::from);
            authors.insert(comment.user_id, author);
        }
        let user = authors.get(&comment.user_id).cloned().flatten();
        responses.push(CommentResponse { comment, user });
    }

    Ok(Json(responses))
}

/// Create comment handler
///
/// # Errors
///
/// * `400 Bad Request` - Missing text or storyId
/// * `404 Not Found` - The story or the parent comment does not exist
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), BackendError> {
    let new = request.validate().map_err(|e| match e {
        SharedError::ValidationError { message, .. } => BackendError::validation(message),
        other => other.into(),
    })?;

    if state.stories.find_by_id(new.story_id).await?.is_none() {
        return Err(BackendError::not_found("Story not found"));
    }
    if let Some(parent_id) = new.parent_id {
        let parent = state.comments.find_by_id(parent_id).await?;
        if !parent.is_some_and(|p| p.story_id == new.story_id) {
            return Err(BackendError::not_found("Parent comment not found"));
        }
    }

    let comment = Comment::new(
        new.story_id,
        new.chapter_id,
        user.id,
        new.text,
        new.parent_id,
        Utc::now(),
    );
    let created = state.comments.create(&comment).await?;

    tracing::info!("{} commented on story {}", user.username, created.story_id);
    let Json(response) = respond(&state, created).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `PUT /api/comments/{id}/like`
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CommentResponse>, BackendError> {
    let id = parse_comment_id(&id)?;
    let comment = state
        .comments
        .toggle_like(id, user.id)
        .await?
        .ok_or_else(|| BackendError::not_found("Comment not found"))?;
    respond(&state, comment).await
}

/// `PUT /api/comments/{id}/pin`
pub async fn toggle_comment_pin(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<CommentResponse>, BackendError> {
    let id = parse_comment_id(&id)?;
    let comment = state
        .comments
        .toggle_pin(id)
        .await?
        .ok_or_else(|| BackendError::not_found("Comment not found"))?;

    tracing::info!(
        "{} {} comment {}",
        admin.username,
        if comment.is_pinned { "pinned" } else { "unpinned" },
        comment.id
    );
    respond(&state, comment).await
}

/// Delete comment handler
///
/// Replies go with the comment.
///
/// # Errors
///
/// * `404 Not Found` - No such comment
/// * `403 Forbidden` - The caller is neither the author nor an admin
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, BackendError> {
    let id = parse_comment_id(&id)?;
    let comment = state
        .comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| BackendError::not_found("Comment not found"))?;

    if comment.user_id != user.id && user.role != Role::Admin {
        tracing::warn!("{} tried to delete comment {}", user.username, comment.id);
        return Err(BackendError::forbidden(
            "User not authorized to delete this comment",
        ));
    }

    state.comments.delete(comment.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
