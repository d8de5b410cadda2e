//! Direct Message HTTP Handlers
//!
//! Thin wrappers around `MessageGateway`; every route requires a logged-in
//! user, and deleting a thread requires an admin.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::backend::error::BackendError;
use crate::backend::extract::Json;
use crate::backend::messaging::gateway::{parse_user_id, MessageGateway};
use crate::backend::middleware::{AdminUser, AuthUser};
use crate::shared::messaging::{ChatThread, DirectMessage, MessageLimit, SendMessageRequest};

/// `GET /api/chats/threads`
pub async fn get_threads(
    State(gateway): State<MessageGateway>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ChatThread>>, BackendError> {
    Ok(Json(gateway.threads(user.id).await?))
}

/// `POST /api/chats/send`
pub async fn send_message(
    State(gateway): State<MessageGateway>,
    AuthUser(user): AuthUser,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<DirectMessage>), BackendError> {
    let receiver = request.requested_receiver();
    let message = gateway
        .send(
            user.id,
            user.role,
            receiver.as_deref(),
            request.text.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// `PUT /api/chats/threads/{other_user_id}/read`
pub async fn mark_thread_read(
    State(gateway): State<MessageGateway>,
    AuthUser(user): AuthUser,
    Path(other_user_id): Path<String>,
) -> Result<StatusCode, BackendError> {
    let other_user_id = parse_user_id(&other_user_id)?;
    gateway.mark_read(user.id, other_user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/chats/limit`
pub async fn get_message_limit(
    State(gateway): State<MessageGateway>,
    AuthUser(user): AuthUser,
) -> Result<Json<MessageLimit>, BackendError> {
    Ok(Json(gateway.quota(user.id, user.role).await?))
}

/// `DELETE /api/chats/threads/{other_user_id}`
pub async fn delete_conversation(
    State(gateway): State<MessageGateway>,
    AdminUser(admin): AdminUser,
    Path(other_user_id): Path<String>,
) -> Result<StatusCode, BackendError> {
    let other_user_id = parse_user_id(&other_user_id)?;
    gateway
        .delete_conversation(admin.id, admin.role, other_user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
