//! Settings HTTP Handlers
//!
//! - `GET /api/settings` - public
//! - `PUT /api/settings` - admin only, bulk upsert

use std::sync::Arc;

use axum::extract::State;
use chrono::Utc;

use crate::backend::error::BackendError;
use crate::backend::extract::Json;
use crate::backend::middleware::AdminUser;
use crate::backend::settings::db::SettingStore;
use crate::shared::{Setting, SettingInput};

/// Get all settings
pub async fn get_settings(
    State(settings): State<Arc<dyn SettingStore>>,
) -> Result<Json<Vec<Setting>>, BackendError> {
    Ok(Json(settings.list().await?))
}

/// Upsert a batch of settings and return the full list
///
/// The body must be a JSON array of `{key, value, mediaType}`.
pub async fn update_settings(
    State(settings): State<Arc<dyn SettingStore>>,
    AdminUser(admin): AdminUser,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Vec<Setting>>, BackendError> {
    if !body.is_array() {
        return Err(BackendError::validation(
            "Request body must be an array of settings.",
        ));
    }
    let items: Vec<SettingInput> = serde_json::from_value(body)
        .map_err(|e| BackendError::validation(format!("Invalid setting: {e}")))?;

    for item in &items {
        item.validate()?;
    }

    settings.upsert_all(&items, Utc::now()).await?;
    tracing::info!("{} settings updated by {}", items.len(), admin.username);

    Ok(Json(settings.list().await?))
}
