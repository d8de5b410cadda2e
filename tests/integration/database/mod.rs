//! PostgreSQL store tests
//!
//! Run with `DATABASE_URL` set; skipped otherwise.

mod migrations_test;
mod story_store_test;
mod store_test;
