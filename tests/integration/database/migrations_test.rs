//! Migrations produce the expected schema

use crate::require_database;

#[tokio::test]
async fn test_every_table_exists() {
    let db = require_database!();

    for table in [
        "users",
        "conversations",
        "direct_messages",
        "settings",
        "stories",
        "story_likes",
        "story_bookmarks",
        "story_ratings",
        "comments",
        "comment_likes",
    ] {
        let result = sqlx::query(&format!("SELECT 1 FROM {table} LIMIT 1"))
            .execute(db.pool())
            .await;
        assert!(result.is_ok(), "table {table} should exist");
    }
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let db = require_database!();
    let result = sqlx::migrate!("./migrations").run(db.pool()).await;
    assert!(result.is_ok(), "re-running migrations should be a no-op");
}
