//! Account, conversation and setting stores against PostgreSQL

use std::sync::Arc;

use chrono::Duration;
use futures_util::future::join_all;
use uuid::Uuid;

use imnovel::backend::auth::users::{NewUser, PgUserStore, UserStore};
use imnovel::backend::error::StoreError;
use imnovel::backend::messaging::db::{AppendOutcome, ConversationStore, PgConversationStore};
use imnovel::backend::settings::db::{PgSettingStore, SettingStore};
use imnovel::shared::{Conversation, DirectMessage, MediaType, Role, SettingInput};

use crate::common::database::db_now;
use crate::require_database;

#[tokio::test]
async fn test_append_is_refused_at_the_limit_under_concurrency() {
    let db = require_database!();
    let store = Arc::new(PgConversationStore::new(db.pool().clone()));
    let (sender, receiver) = (Uuid::new_v4(), Uuid::new_v4());
    let now = db_now();
    let conversation = store
        .create(Conversation::open(sender, receiver, now))
        .await
        .unwrap();

    let sends = (0..10).map(|i| {
        let store = store.clone();
        async move {
            let message = DirectMessage::new(sender, receiver, format!("tin {i}"), now);
            store
                .append_message(conversation.id, &message, Some(5))
                .await
                .unwrap()
        }
    });
    let outcomes = join_all(sends).await;

    let appended = outcomes
        .iter()
        .filter(|o| matches!(o, AppendOutcome::Appended { .. }))
        .count();
    let refused = outcomes
        .iter()
        .filter(|o| **o == AppendOutcome::LimitReached)
        .count();
    assert_eq!((appended, refused), (5, 5));

    let stored = store.find_by_pair(sender, receiver).await.unwrap().unwrap();
    assert_eq!(stored.send_count, 5);
    assert_eq!(stored.messages.len(), 5);
}

#[tokio::test]
async fn test_window_resets_once_under_concurrency() {
    let db = require_database!();
    let store = Arc::new(PgConversationStore::new(db.pool().clone()));
    let yesterday = db_now() - Duration::days(1);
    let conversation = store
        .create(Conversation::open(Uuid::new_v4(), Uuid::new_v4(), yesterday))
        .await
        .unwrap();
    let observed = conversation.reset_at;

    let resets = (0..8).map(|_| {
        let store = store.clone();
        async move {
            store
                .reset_window(conversation.id, observed, db_now())
                .await
                .unwrap()
        }
    });
    let won = join_all(resets).await.into_iter().filter(|r| *r).count();
    assert_eq!(won, 1);
}

#[tokio::test]
async fn test_reversed_pair_returns_existing_conversation() {
    let db = require_database!();
    let store = PgConversationStore::new(db.pool().clone());
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    let first = store.create(Conversation::open(a, b, db_now())).await.unwrap();
    let second = store.create(Conversation::open(b, a, db_now())).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.list_for_user(b).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_takes_messages_along() {
    let db = require_database!();
    let store = PgConversationStore::new(db.pool().clone());
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let now = db_now();
    let conversation = store.create(Conversation::open(a, b, now)).await.unwrap();
    store
        .append_message(conversation.id, &DirectMessage::new(a, b, "xin chào", now), None)
        .await
        .unwrap();

    assert!(store.delete(conversation.id).await.unwrap());

    let row = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM direct_messages WHERE conversation_id = $1",
    )
    .bind(conversation.id)
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(row, 0);
    assert!(store.find_by_pair(a, b).await.unwrap().is_none());
}

#[tokio::test]
async fn test_user_uniqueness_and_ally_release() {
    let db = require_database!();
    let users = PgUserStore::new(db.pool().clone());
    let contractor = db.user(Role::Contractor).await;
    let mut ally = db.user(Role::User).await;

    let err = users
        .create(NewUser {
            username: contractor.username.clone(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "hash".to_string(),
            role: Role::User,
            race: "Nhân tộc".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    ally.ally_of = Some(contractor.id);
    users.save(&ally).await.unwrap().unwrap();
    assert_eq!(
        users.find_by_id(ally.id).await.unwrap().unwrap().ally_of,
        Some(contractor.id)
    );

    assert!(users.delete(contractor.id).await.unwrap());
    assert_eq!(users.find_by_id(ally.id).await.unwrap().unwrap().ally_of, None);
}

#[tokio::test]
async fn test_settings_upsert_by_key() {
    let db = require_database!();
    let store = PgSettingStore::new(db.pool().clone());
    let key = format!("banner-{}", Uuid::new_v4());

    for value in ["/api/files/a.png", "/api/files/b.mp4"] {
        store
            .upsert_all(
                &[SettingInput {
                    key: key.clone(),
                    value: value.to_string(),
                    media_type: if value.ends_with(".png") {
                        MediaType::Image
                    } else {
                        MediaType::Video
                    },
                }],
                db_now(),
            )
            .await
            .unwrap();
    }

    let matching: Vec<_> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .filter(|s| s.key == key)
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].value, "/api/files/b.mp4");
    assert_eq!(matching[0].media_type, MediaType::Video);
}
