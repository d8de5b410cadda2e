//! Story and comment stores against PostgreSQL

use uuid::Uuid;

use imnovel::backend::auth::users::{PgUserStore, UserStore};
use imnovel::backend::comments::{CommentStore, PgCommentStore};
use imnovel::backend::error::StoreError;
use imnovel::backend::stories::{PgStoryStore, StoryFilter, StoryStore};
use imnovel::shared::story::{BlockKind, Chapter, ContentBlock, Rating, Volume};
use imnovel::shared::{Comment, Role, Story, StoryInput};

use crate::common::database::{db_now, TestDatabase};
use crate::require_database;

/// A story with a title no other run uses
async fn story(db: &TestDatabase, creator_id: Uuid, title: &str) -> Story {
    let story = StoryInput {
        title: Some(format!("{title} {}", Uuid::new_v4())),
        author: Some("Nhĩ Căn".to_string()),
        cover_image_url: Some("/api/files/cover.png".to_string()),
        genres: Some(vec!["Tiên hiệp".to_string(), "Huyền huyễn".to_string()]),
        description: Some("Một thiếu niên bước lên con đường tu tiên.".to_string()),
        ..StoryInput::default()
    }
    .into_story(creator_id, db_now())
    .unwrap();
    PgStoryStore::new(db.pool().clone())
        .create(&story)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_volumes_survive_the_round_trip() {
    let db = require_database!();
    let stories = PgStoryStore::new(db.pool().clone());
    let creator = db.user(Role::Contractor).await;
    let mut created = story(&db, creator.id, "Tiên Nghịch").await;

    created.volumes = vec![Volume {
        id: Uuid::new_v4(),
        title: "Quyển 1".to_string(),
        cover_image_url: None,
        chapters: vec![Chapter {
            id: Uuid::new_v4(),
            title: "Chương 1".to_string(),
            content_blocks: vec![
                ContentBlock {
                    id: Uuid::new_v4(),
                    kind: BlockKind::Text,
                    value: "Vương Lâm rời làng.".to_string(),
                    alt: None,
                },
                ContentBlock {
                    id: Uuid::new_v4(),
                    kind: BlockKind::Image,
                    value: "/api/files/map.png".to_string(),
                    alt: Some("Bản đồ".to_string()),
                },
            ],
            timestamp: 1_700_000_000_000,
        }],
    }];
    stories.save(&created).await.unwrap().unwrap();

    let found = stories.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found.volumes, created.volumes);
    assert_eq!(found.genres, created.genres);
    assert_eq!(found.creator_id, Some(creator.id));
}

#[tokio::test]
async fn test_titles_conflict_ignoring_case() {
    let db = require_database!();
    let stories = PgStoryStore::new(db.pool().clone());
    let creator = db.user(Role::Contractor).await;
    let first = story(&db, creator.id, "Phàm Nhân").await;

    assert!(stories
        .title_taken(&first.title.to_uppercase(), None)
        .await
        .unwrap());
    assert!(!stories
        .title_taken(&first.title, Some(first.id))
        .await
        .unwrap());

    let mut copy = first.clone();
    copy.id = Uuid::new_v4();
    copy.title = first.title.to_lowercase();
    let err = stories.create(&copy).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn test_reader_toggles_and_rating_replacement() {
    let db = require_database!();
    let stories = PgStoryStore::new(db.pool().clone());
    let creator = db.user(Role::Contractor).await;
    let reader = db.user(Role::User).await;
    let created = story(&db, creator.id, "Cầu Ma").await;

    let liked = stories.toggle_like(created.id, reader.id).await.unwrap().unwrap();
    assert_eq!(liked.liked_by, vec![reader.id]);
    let unliked = stories.toggle_like(created.id, reader.id).await.unwrap().unwrap();
    assert!(unliked.liked_by.is_empty());

    let marked = stories.toggle_bookmark(created.id, reader.id).await.unwrap().unwrap();
    assert_eq!(marked.bookmarks, vec![reader.id]);
    let shelf = stories
        .list(StoryFilter::BookmarkedBy(reader.id))
        .await
        .unwrap();
    assert_eq!(shelf.len(), 1);
    assert_eq!(shelf[0].id, created.id);

    stories.rate(created.id, reader.id, 2).await.unwrap();
    let rated = stories.rate(created.id, reader.id, 5).await.unwrap().unwrap();
    assert_eq!(
        rated.ratings,
        vec![Rating {
            user_id: reader.id,
            score: 5
        }]
    );
    assert_eq!(rated.average_rating(), Some(5.0));

    assert!(stories
        .toggle_like(Uuid::new_v4(), reader.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let db = require_database!();
    let stories = PgStoryStore::new(db.pool().clone());
    let creator = db.user(Role::Contractor).await;
    let tag = Uuid::new_v4().simple().to_string();
    let plain = story(&db, creator.id, &format!("Ngã Dục {tag}")).await;
    let percent = story(&db, creator.id, &format!("100% {tag}")).await;

    let found = stories
        .list(StoryFilter::Search(tag.to_uppercase()))
        .await
        .unwrap();
    let mut ids: Vec<Uuid> = found.iter().map(|s| s.id).collect();
    ids.sort();
    let mut expected = vec![plain.id, percent.id];
    expected.sort();
    assert_eq!(ids, expected);

    let found = stories
        .list(StoryFilter::Search(format!("% {tag}")))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, percent.id);
}

#[tokio::test]
async fn test_deleting_a_story_takes_comments_and_replies() {
    let db = require_database!();
    let stories = PgStoryStore::new(db.pool().clone());
    let comments = PgCommentStore::new(db.pool().clone());
    let creator = db.user(Role::Contractor).await;
    let reader = db.user(Role::User).await;
    let created = story(&db, creator.id, "Tru Tiên").await;

    let root = comments
        .create(&Comment::new(created.id, None, reader.id, "Hay quá", None, db_now()))
        .await
        .unwrap();
    let reply = comments
        .create(&Comment::new(
            created.id,
            None,
            creator.id,
            "Cảm ơn",
            Some(root.id),
            db_now(),
        ))
        .await
        .unwrap();
    comments.toggle_like(reply.id, reader.id).await.unwrap();

    assert!(comments.delete(root.id).await.unwrap());
    assert!(comments.find_by_id(reply.id).await.unwrap().is_none());

    let kept = comments
        .create(&Comment::new(
            created.id,
            Some("chuong-1".to_string()),
            reader.id,
            "Chương này hay",
            None,
            db_now(),
        ))
        .await
        .unwrap();
    assert!(stories.delete(created.id).await.unwrap());
    assert!(comments.find_by_id(kept.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_activity_counts_and_account_removal() {
    let db = require_database!();
    let stories = PgStoryStore::new(db.pool().clone());
    let comments = PgCommentStore::new(db.pool().clone());
    let users = PgUserStore::new(db.pool().clone());
    let creator = db.user(Role::Contractor).await;
    let reader = db.user(Role::User).await;
    let created = story(&db, creator.id, "Đấu Phá").await;

    for text in ["Một", "Hai"] {
        let comment = comments
            .create(&Comment::new(created.id, None, reader.id, text, None, db_now()))
            .await
            .unwrap();
        comments.toggle_like(comment.id, creator.id).await.unwrap();
        comments.toggle_like(comment.id, reader.id).await.unwrap();
    }

    let activity = comments.activity_by_author().await.unwrap();
    let reader_activity = activity[&reader.id];
    assert_eq!(reader_activity.comments, 2);
    assert_eq!(reader_activity.likes_received, 4);
    assert_eq!(stories.count_by_creator().await.unwrap()[&creator.id], 1);

    stories.toggle_bookmark(created.id, reader.id).await.unwrap();
    stories.rate(created.id, reader.id, 4).await.unwrap();
    comments.forget_user(reader.id).await.unwrap();
    stories.forget_user(reader.id).await.unwrap();
    assert!(users.delete(reader.id).await.unwrap());

    let after = stories.find_by_id(created.id).await.unwrap().unwrap();
    assert!(after.bookmarks.is_empty());
    assert!(after.ratings.is_empty());
    assert!(comments.list(Some(created.id), None).await.unwrap().is_empty());

    assert!(users.delete(creator.id).await.unwrap());
    let orphaned = stories.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(orphaned.creator_id, None);
}
