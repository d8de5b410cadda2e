/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration from
 * environment variables (optionally seeded from a `.env` file by `main`).
 *
 * # Variables
 *
 * | Variable | Default | Meaning |
 * |---|---|---|
 * | `SERVER_PORT` | `5001` | listening port |
 * | `DATABASE_URL` | unset | PostgreSQL URL; unset means in-memory stores |
 * | `JWT_SECRET` | required in release builds | token signing secret |
 * | `JWT_TTL_DAYS` | `30` | token lifetime, 1 to 3650 days |
 * | `PRIVILEGED_ACCOUNT_ID` | unset | admin receiving all standard users' messages |
 * | `DAILY_MESSAGE_LIMIT` | `5` | messages per day for standard users |
 * | `QUOTA_UTC_OFFSET_MINUTES` | server local time | fixed UTC offset of the quota day |
 * | `BCRYPT_COST` | `12` | bcrypt work factor |
 */

use std::fmt::Display;
use std::str::FromStr;

use chrono::FixedOffset;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::auth::sessions::{DEFAULT_TOKEN_TTL_DAYS, MAX_TOKEN_TTL_DAYS};
use crate::backend::messaging::quota::{QuotaPolicy, DEFAULT_DAILY_LIMIT};

pub const DEFAULT_PORT: u16 = 5001;

#[cfg(debug_assertions)]
const DEVELOPMENT_JWT_SECRET: &str = "imnovel-development-secret";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Everything the server reads from its environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_days: i64,
    pub privileged_account: Option<Uuid>,
    pub daily_message_limit: u32,
    /// Fixed offset for the quota day; `None` follows the server's local time
    pub quota_offset: Option<FixedOffset>,
    pub bcrypt_cost: u32,
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => development_secret()?,
        };

        let offset_minutes: Option<i32> =
            parse_opt(get("QUOTA_UTC_OFFSET_MINUTES"), "QUOTA_UTC_OFFSET_MINUTES")?;
        let quota_offset = offset_minutes
            .map(|minutes| {
                minutes
                    .checked_mul(60)
                    .and_then(FixedOffset::east_opt)
                    .ok_or(ConfigError::Invalid {
                        key: "QUOTA_UTC_OFFSET_MINUTES",
                        message: format!("{minutes} is out of range"),
                    })
            })
            .transpose()?;

        let daily_message_limit = parse_opt(get("DAILY_MESSAGE_LIMIT"), "DAILY_MESSAGE_LIMIT")?
            .unwrap_or(DEFAULT_DAILY_LIMIT);

        let bcrypt_cost = parse_opt(get("BCRYPT_COST"), "BCRYPT_COST")?
            .unwrap_or(bcrypt::DEFAULT_COST);
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                message: format!("{bcrypt_cost} is not between 4 and 31"),
            });
        }

        let jwt_ttl_days = parse_opt(get("JWT_TTL_DAYS"), "JWT_TTL_DAYS")?
            .unwrap_or(DEFAULT_TOKEN_TTL_DAYS);
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&jwt_ttl_days) {
            return Err(ConfigError::Invalid {
                key: "JWT_TTL_DAYS",
                message: format!("{jwt_ttl_days} is not between 1 and {MAX_TOKEN_TTL_DAYS}"),
            });
        }

        Ok(Self {
            port: parse_opt(get("SERVER_PORT"), "SERVER_PORT")?.unwrap_or(DEFAULT_PORT),
            database_url: get("DATABASE_URL"),
            jwt_secret,
            jwt_ttl_days,
            privileged_account: parse_opt(get("PRIVILEGED_ACCOUNT_ID"), "PRIVILEGED_ACCOUNT_ID")?,
            daily_message_limit,
            quota_offset,
            bcrypt_cost,
        })
    }

    pub fn quota_policy(&self) -> QuotaPolicy {
        match self.quota_offset {
            Some(offset) => QuotaPolicy::fixed(self.daily_message_limit, offset),
            None => QuotaPolicy::local(self.daily_message_limit),
        }
    }
}

fn parse_opt<T>(value: Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                message: e.to_string(),
            })
        })
        .transpose()
}

#[cfg(debug_assertions)]
fn development_secret() -> Result<String, ConfigError> {
    tracing::warn!("JWT_SECRET not set, using the development secret");
    Ok(DEVELOPMENT_JWT_SECRET.to_string())
}

#[cfg(not(debug_assertions))]
fn development_secret() -> Result<String, ConfigError> {
    Err(ConfigError::Missing("JWT_SECRET"))
}

/// Connect to PostgreSQL and bring the schema up to date
pub async fn load_database(database_url: &str) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database migrations completed successfully");

    Ok(pool)
}
