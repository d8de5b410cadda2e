//! Database test fixtures
//!
//! The PostgreSQL suite only runs when `DATABASE_URL` points at a
//! disposable database. Without it, every database test returns early.
//! Tests never truncate: each one works on rows with fresh ids, so the
//! suite may share a database with other runs.

use chrono::{DateTime, SubsecRound, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use imnovel::backend::auth::users::{NewUser, PgUserStore, User, UserStore};
use imnovel::backend::server::config::load_database;
use imnovel::shared::Role;

/// Connected, migrated test database
pub struct TestDatabase {
    pool: PgPool,
}

impl TestDatabase {
    /// Connect and migrate, or `None` when `DATABASE_URL` is unset
    pub async fn connect() -> Option<Self> {
        let database_url = std::env::var("DATABASE_URL").ok()?;
        let pool = load_database(&database_url)
            .await
            .expect("Failed to connect to and migrate the test database");
        Some(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert an account with a unique username and email
    pub async fn user(&self, role: Role) -> User {
        let tag = Uuid::new_v4().simple().to_string();
        PgUserStore::new(self.pool.clone())
            .create(NewUser {
                username: format!("u{}", &tag[..20]),
                email: format!("{tag}@example.com"),
                password_hash: "hash".to_string(),
                role,
                race: "Nhân tộc".to_string(),
            })
            .await
            .expect("Failed to create test user")
    }
}

/// Now, at the precision PostgreSQL stores
pub fn db_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Bind the fixture or skip the test
#[macro_export]
macro_rules! require_database {
    () => {
        match $crate::common::database::TestDatabase::connect().await {
            Some(db) => db,
            None => {
                eprintln!("DATABASE_URL not set, skipping");
                return;
            }
        }
    };
}
