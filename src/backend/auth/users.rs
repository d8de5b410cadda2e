/**
 * User Model and Storage
 *
 * This module defines the user document and the `UserStore` trait with its
 * two implementations:
 *
 * - `PgUserStore` - PostgreSQL via sqlx (production)
 * - `MemoryUserStore` - in-process map (tests, database-less runs)
 *
 * Updates follow a whole-document save: load a `User`, change fields, and
 * hand it back to `UserStore::save`.
 */

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::StoreError;
use crate::shared::Role;

/// Avatar used until the user uploads a picture
pub const DEFAULT_PICTURE: &str = "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 24 24' fill='%23a0aec0'%3E%3Cpath fill-rule='evenodd' d='M18.685 19.097A9.723 9.723 0 0 0 21.75 12c0-5.385-4.365-9.75-9.75-9.75S2.25 6.615 2.25 12a9.723 9.723 0 0 0 3.065 7.097A9.716 9.716 0 0 0 12 21.75a9.716 9.716 0 0 0 6.685-2.653Zm-12.54-1.285A7.486 7.486 0 0 1 12 15c1.447 0 2.796.414 3.91 1.153A7.47 7.47 0 0 1 18 12c0-4.135-3.365-7.5-7.5-7.5S3 7.865 3 12a7.47 7.47 0 0 1 2.088 5.002Z' clip-rule='evenodd' /%3E%3Cpath d='M12 9a3.75 3.75 0 1 0 0 7.5 3.75 3.75 0 0 0 0-7.5ZM12 15a2.25 2.25 0 1 1 0-4.5 2.25 2.25 0 0 1 0 4.5Z' /%3E%3C/svg%3E";

/// User struct representing a stored account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    /// Username (unique, 3-30 chars, alphanumeric + underscore)
    pub username: String,
    /// User email address (unique)
    pub email: String,
    /// Hashed password (bcrypt); never serialized
    pub password_hash: String,
    /// Display name
    pub name: String,
    /// Avatar URL or data URI
    pub picture: String,
    pub role: Role,
    pub race: String,
    /// Contractor this user is an ally of
    pub ally_of: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name, falling back to the username
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}

/// Fields needed to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub race: String,
}

impl NewUser {
    fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            name: self.username.clone(),
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            picture: DEFAULT_PICTURE.to_string(),
            role: self.role,
            race: self.race,
            ally_of: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persistence for user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user. Fails with `StoreError::Conflict` on a duplicate
    /// username or email.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Find a user whose email or username equals `identifier`
    async fn find_by_login(&self, identifier: &str) -> Result<Option<User>, StoreError>;

    /// All users, oldest first
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    /// Users holding `role`, oldest first
    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, StoreError>;

    /// Overwrite the stored document with `user` and bump `updated_at`
    ///
    /// Returns `None` if the user no longer exists.
    async fn save(&self, user: &User) -> Result<Option<User>, StoreError>;

    /// Delete a user. Returns `false` if there was nothing to delete.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, name, picture, role, race, ally_of, created_at, updated_at";

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        name: row.try_get("name")?,
        picture: row.try_get("picture")?,
        role,
        race: row.try_get("race")?,
        ally_of: row.try_get("ally_of")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = new_user.into_user(Utc::now());

        let sql = format!(
            r#"
            INSERT INTO users ({USER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.name)
            .bind(&user.picture)
            .bind(user.role.as_str())
            .bind(&user.race)
            .bind(user.ally_of)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await?;

        user_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one_where("username = $1", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one_where("email = $1", email).await
    }

    async fn find_by_login(&self, identifier: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one_where("email = $1 OR username = $1", identifier)
            .await
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("count")?)
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY created_at ASC");
        let rows = sqlx::query(&sql)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn save(&self, user: &User) -> Result<Option<User>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, name = $5, picture = $6,
                role = $7, race = $8, ally_of = $9, updated_at = $10
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.name)
            .bind(&user.picture)
            .bind(user.role.as_str())
            .bind(&user.race)
            .bind(user.ally_of)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-process user store
///
/// Keeps the same uniqueness rules as the database schema.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn conflict(users: &HashMap<Uuid, User>, candidate: &User) -> Option<StoreError> {
        users
            .values()
            .filter(|u| u.id != candidate.id)
            .find_map(|u| {
                if u.username == candidate.username {
                    Some(StoreError::Conflict("users_username_key".to_string()))
                } else if u.email == candidate.email {
                    Some(StoreError::Conflict("users_email_key".to_string()))
                } else {
                    None
                }
            })
    }

    fn sorted(mut users: Vec<User>) -> Vec<User> {
        users.sort_by_key(|u| u.created_at);
        users
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let user = new_user.into_user(Utc::now());
        if let Some(conflict) = Self::conflict(&users, &user) {
            return Err(conflict);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_login(&self, identifier: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email == identifier || u.username == identifier)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        Ok(Self::sorted(users.values().cloned().collect()))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        Ok(Self::sorted(
            users.values().filter(|u| u.role == role).cloned().collect(),
        ))
    }

    async fn save(&self, user: &User) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Ok(None);
        }
        if let Some(conflict) = Self::conflict(&users, user) {
            return Err(conflict);
        }
        let mut saved = user.clone();
        saved.updated_at = Utc::now();
        users.insert(saved.id, saved.clone());
        Ok(Some(saved))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let removed = users.remove(&id).is_some();
        if removed {
            // Mirrors ON DELETE SET NULL on users.ally_of
            for user in users.values_mut() {
                if user.ally_of == Some(id) {
                    user.ally_of = None;
                }
            }
        }
        Ok(removed)
    }
}
