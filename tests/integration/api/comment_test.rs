//! Comment API integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{create_cast, create_test_user, TestApp, TestUser};
use crate::{assert_error, assert_status};

async fn create_story(app: &TestApp, creator: &TestUser) -> String {
    let response = app
        .post(
            "/api/stories",
            creator.token(),
            json!({
                "title": "Nhất Niệm Vĩnh Hằng",
                "author": "Nhĩ Căn",
                "coverImageUrl": "/api/files/cover.png",
                "genres": ["Tiên hiệp"],
                "description": "Bạch Tiểu Thuần...",
            }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    response.body["id"].as_str().unwrap().to_string()
}

async fn comment(app: &TestApp, user: &TestUser, body: Value) -> Value {
    let response = app.post("/api/comments", user.token(), body).await;
    assert_status!(response, StatusCode::CREATED);
    response.body
}

#[tokio::test]
async fn test_comment_thread() {
    let app = TestApp::new();
    let (_admin, contractor, reader) = create_cast(&app).await;
    let story_id = create_story(&app, &contractor).await;

    let response = app
        .post("/api/comments", reader.token(), json!({ "storyId": story_id }))
        .await;
    assert_error!(response, StatusCode::BAD_REQUEST, "Text and storyId are required");

    let response = app
        .post("/api/comments", None, json!({ "storyId": story_id, "text": "Hay" }))
        .await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    let root = comment(
        &app,
        &reader,
        json!({ "storyId": story_id, "chapterId": "c-1", "text": "Chương hay", "parentId": "" }),
    )
    .await;
    assert_eq!(root["user"]["username"], "reader");
    assert_eq!(root["parentId"], Value::Null);
    assert_eq!(root["isPinned"], false);
    assert!(root["timestamp"].is_i64());

    comment(
        &app,
        &contractor,
        json!({ "storyId": story_id, "chapterId": "c-1", "text": "Cảm ơn", "parentId": root["id"] }),
    )
    .await;

    let response = app.get(&format!("/api/comments?storyId={story_id}"), None).await;
    assert_status!(response, StatusCode::OK);
    let texts: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["text"].as_str())
        .collect();
    assert_eq!(texts.len(), 2);

    let response = app
        .get(&format!("/api/comments?storyId={story_id}&chapterId=c-2"), None)
        .await;
    assert_eq!(response.body, json!([]));

    let response = app
        .delete(&format!("/api/comments/{}", root["id"].as_str().unwrap()), reader.token())
        .await;
    assert_status!(response, StatusCode::NO_CONTENT);
    let response = app.get(&format!("/api/comments?storyId={story_id}"), None).await;
    assert_eq!(response.body, json!([]));
}

#[tokio::test]
async fn test_like_pin_and_delete_rights() {
    let app = TestApp::new();
    let (admin, contractor, reader) = create_cast(&app).await;
    let stranger = create_test_user(&app, "stranger").await;
    let story_id = create_story(&app, &contractor).await;
    let created = comment(&app, &reader, json!({ "storyId": story_id, "text": "Hay" })).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .put(&format!("/api/comments/{id}/like"), stranger.token(), None)
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["likes"], json!([stranger.id.to_string()]));

    let response = app
        .put(&format!("/api/comments/{id}/pin"), contractor.token(), None)
        .await;
    assert_status!(response, StatusCode::FORBIDDEN);
    let response = app.put(&format!("/api/comments/{id}/pin"), admin.token(), None).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["isPinned"], true);

    let response = app.delete(&format!("/api/comments/{id}"), stranger.token()).await;
    assert_error!(
        response,
        StatusCode::FORBIDDEN,
        "User not authorized to delete this comment"
    );
    let response = app.delete(&format!("/api/comments/{id}"), admin.token()).await;
    assert_status!(response, StatusCode::NO_CONTENT);
    let response = app.delete(&format!("/api/comments/{id}"), admin.token()).await;
    assert_error!(response, StatusCode::NOT_FOUND, "Comment not found");
}

#[tokio::test]
async fn test_leaderboard_counts_activity() {
    let app = TestApp::new();
    let (admin, contractor, reader) = create_cast(&app).await;
    let story_id = create_story(&app, &contractor).await;
    let created = comment(&app, &reader, json!({ "storyId": story_id, "text": "Hay" })).await;
    app.put(
        &format!("/api/comments/{}/like", created["id"].as_str().unwrap()),
        admin.token(),
        None,
    )
    .await;

    let response = app.get("/api/users/leaderboard", None).await;
    assert_status!(response, StatusCode::OK);
    let board: Vec<(String, i64)> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            (
                e["username"].as_str().unwrap().to_string(),
                e["totalScore"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        board,
        vec![("builder".to_string(), 10), ("reader".to_string(), 3)]
    );
}
