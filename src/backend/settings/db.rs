//! Setting storage
//!
//! Settings are keyed by `key`. `upsert_all` writes a whole batch in one
//! transaction so a failed item leaves the previous values in place.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::StoreError;
use crate::shared::{MediaType, Setting, SettingInput};

#[async_trait]
pub trait SettingStore: Send + Sync {
    /// Every setting, ordered by key
    async fn list(&self) -> Result<Vec<Setting>, StoreError>;

    /// Insert or update each item by key, all or nothing
    async fn upsert_all(
        &self,
        items: &[SettingInput],
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

fn setting_from_row(row: &PgRow) -> Result<Setting, StoreError> {
    let media_type: String = row.try_get("media_type")?;
    let media_type = media_type
        .parse::<MediaType>()
        .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))?;

    Ok(Setting {
        id: row.try_get("id")?,
        key: row.try_get("key")?,
        value: row.try_get("value")?,
        media_type,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// PostgreSQL-backed setting store
#[derive(Clone)]
pub struct PgSettingStore {
    pool: PgPool,
}

impl PgSettingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingStore for PgSettingStore {
    async fn list(&self) -> Result<Vec<Setting>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, key, value, media_type, created_at, updated_at
            FROM settings
            ORDER BY key ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(setting_from_row).collect()
    }

    async fn upsert_all(
        &self,
        items: &[SettingInput],
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO settings (id, key, value, media_type, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $5)
                ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value,
                    media_type = EXCLUDED.media_type,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&item.key)
            .bind(&item.value)
            .bind(item.media_type.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// In-process setting store
#[derive(Default)]
pub struct MemorySettingStore {
    settings: RwLock<BTreeMap<String, Setting>>,
}

impl MemorySettingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingStore for MemorySettingStore {
    async fn list(&self) -> Result<Vec<Setting>, StoreError> {
        Ok(self.settings.read().await.values().cloned().collect())
    }

    async fn upsert_all(
        &self,
        items: &[SettingInput],
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut settings = self.settings.write().await;
        for item in items {
            settings
                .entry(item.key.clone())
                .and_modify(|existing| {
                    existing.value = item.value.clone();
                    existing.media_type = item.media_type;
                    existing.updated_at = now;
                })
                .or_insert_with(|| Setting {
                    id: Uuid::new_v4(),
                    key: item.key.clone(),
                    value: item.value.clone(),
                    media_type: item.media_type,
                    created_at: now,
                    updated_at: now,
                });
        }
        Ok(())
    }
}
