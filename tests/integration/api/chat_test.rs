//! Direct message API integration tests
//!
//! Routing to the privileged account, the daily quota, threads, read
//! receipts and thread deletion through `/api/chats`.

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

use imnovel::backend::auth::NewUser;
use imnovel::shared::user::DEFAULT_RACE;
use imnovel::shared::Role;

use crate::common::{create_cast, login, TestApp, TEST_PASSWORD};
use crate::{assert_error, assert_status};

#[tokio::test]
async fn test_standard_user_message_reaches_admin() {
    let app = TestApp::new();
    let (admin, contractor, reader) = create_cast(&app).await;

    // receiverId is ignored for standard users
    let response = app
        .post(
            "/api/chats/send",
            reader.token(),
            json!({ "text": "Xin chào", "receiverId": contractor.id }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["senderId"], reader.id.to_string());
    assert_eq!(response.body["receiverId"], admin.id.to_string());
    assert_eq!(response.body["isRead"], false);
    assert!(response.body["timestamp"].is_i64());

    let threads = app.get("/api/chats/threads", admin.token()).await;
    assert_status!(threads, StatusCode::OK);
    let threads = threads.body.as_array().unwrap().clone();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["userId"], reader.id.to_string());
    assert_eq!(threads[0]["userName"], "reader");
    assert_eq!(threads[0]["messages"][0]["text"], "Xin chào");
}

#[tokio::test]
async fn test_standard_user_receiver_of_any_type_is_overridden() {
    let app = TestApp::new();
    let (admin, _contractor, reader) = create_cast(&app).await;

    for receiver in [json!(42), json!({ "id": "x" }), json!(null), json!("not-a-uuid")] {
        let response = app
            .post(
                "/api/chats/send",
                reader.token(),
                json!({ "text": "hi", "receiverId": receiver }),
            )
            .await;
        assert_status!(response, StatusCode::CREATED);
        assert_eq!(response.body["receiverId"], admin.id.to_string());
    }
}

#[tokio::test]
async fn test_malformed_body_is_a_json_400() {
    let app = TestApp::new();
    let (_admin, contractor, reader) = create_cast(&app).await;

    let response = app
        .post("/api/chats/send", reader.token(), json!({ "text": 123 }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["status"], 400);
    assert!(response.body["error"].is_string());

    let response = app
        .post(
            "/api/chats/send",
            contractor.token(),
            json!({ "text": "hi", "receiverId": 42 }),
        )
        .await;
    assert_error!(response, StatusCode::BAD_REQUEST, "Invalid user id: 42");
}

#[tokio::test]
async fn test_daily_quota_and_rollover() {
    let app = TestApp::new();
    let (_admin, _contractor, reader) = create_cast(&app).await;

    let limit = app.get("/api/chats/limit", reader.token()).await;
    assert_eq!(limit.body, json!({ "limit": 5, "remaining": 5 }));

    for n in 0..5 {
        let response = app
            .post("/api/chats/send", reader.token(), json!({ "text": format!("#{n}") }))
            .await;
        assert_status!(response, StatusCode::CREATED);
    }

    let refused = app
        .post("/api/chats/send", reader.token(), json!({ "text": "one more" }))
        .await;
    assert_status!(refused, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(refused.body["limit"], 5);
    assert_eq!(refused.body["remaining"], 0);

    let limit = app.get("/api/chats/limit", reader.token()).await;
    assert_eq!(limit.body, json!({ "limit": 5, "remaining": 0 }));

    app.clock.advance(Duration::days(1));

    let limit = app.get("/api/chats/limit", reader.token()).await;
    assert_eq!(limit.body, json!({ "limit": 5, "remaining": 5 }));

    let response = app
        .post("/api/chats/send", reader.token(), json!({ "text": "next day" }))
        .await;
    assert_status!(response, StatusCode::CREATED);
}

#[tokio::test]
async fn test_privileged_roles_are_unlimited() {
    let app = TestApp::new();
    let (admin, contractor, reader) = create_cast(&app).await;

    for _ in 0..7 {
        let response = app
            .post(
                "/api/chats/send",
                contractor.token(),
                json!({ "text": "update", "receiverId": reader.id }),
            )
            .await;
        assert_status!(response, StatusCode::CREATED);
        assert_eq!(response.body["receiverId"], reader.id.to_string());
    }

    for token in [admin.token(), contractor.token()] {
        let limit = app.get("/api/chats/limit", token).await;
        assert_eq!(limit.body, json!({ "limit": -1, "remaining": -1 }));
    }
}

#[tokio::test]
async fn test_send_validation() {
    let app = TestApp::new();
    let (admin, contractor, reader) = create_cast(&app).await;

    let response = app.post("/api/chats/send", reader.token(), json!({})).await;
    assert_error!(response, StatusCode::BAD_REQUEST, "Text and receiverId are required.");

    let response = app
        .post("/api/chats/send", contractor.token(), json!({ "text": "hi" }))
        .await;
    assert_error!(response, StatusCode::BAD_REQUEST, "Text and receiverId are required.");

    let response = app
        .post(
            "/api/chats/send",
            contractor.token(),
            json!({ "text": "hi", "receiverId": "not-a-uuid" }),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = app
        .post(
            "/api/chats/send",
            admin.token(),
            json!({ "text": "hi", "receiverId": admin.id }),
        )
        .await;
    assert_error!(response, StatusCode::BAD_REQUEST, "Cannot send message to yourself.");

    let response = app
        .post(
            "/api/chats/send",
            admin.token(),
            json!({ "text": "hi", "receiverId": uuid::Uuid::new_v4() }),
        )
        .await;
    assert_error!(response, StatusCode::NOT_FOUND, "Receiver not found");
}

#[tokio::test]
async fn test_send_without_privileged_account() {
    let app = TestApp::new();
    app.state
        .users
        .create(NewUser {
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            password_hash: bcrypt::hash(TEST_PASSWORD, 4).unwrap(),
            role: Role::User,
            race: DEFAULT_RACE.to_string(),
        })
        .await
        .unwrap();
    let reader = login(&app, "reader").await;

    let response = app
        .post("/api/chats/send", reader.token(), json!({ "text": "hello" }))
        .await;
    assert_error!(
        response,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Admin user not found. The system is not configured correctly."
    );
}

#[tokio::test]
async fn test_mark_thread_read() {
    let app = TestApp::new();
    let (admin, _contractor, reader) = create_cast(&app).await;

    for text in ["one", "two"] {
        app.post("/api/chats/send", reader.token(), json!({ "text": text }))
            .await;
    }

    let uri = format!("/api/chats/threads/{}/read", reader.id);
    let response = app.put(&uri, admin.token(), None).await;
    assert_status!(response, StatusCode::NO_CONTENT);

    let threads = app.get("/api/chats/threads", admin.token()).await;
    let messages = threads.body[0]["messages"].as_array().unwrap().clone();
    assert!(messages.iter().all(|m| m["isRead"] == true));

    // Idempotent, and a missing conversation is not an error
    let response = app.put(&uri, admin.token(), None).await;
    assert_status!(response, StatusCode::NO_CONTENT);
    let response = app
        .put(
            &format!("/api/chats/threads/{}/read", uuid::Uuid::new_v4()),
            admin.token(),
            None,
        )
        .await;
    assert_status!(response, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_thread_requires_admin() {
    let app = TestApp::new();
    let (admin, _contractor, reader) = create_cast(&app).await;

    app.post("/api/chats/send", reader.token(), json!({ "text": "hello" }))
        .await;

    let uri = format!("/api/chats/threads/{}", admin.id);
    let response = app.delete(&uri, reader.token()).await;
    assert_error!(response, StatusCode::FORBIDDEN, "Not authorized as an admin");

    let uri = format!("/api/chats/threads/{}", reader.id);
    let response = app.delete(&uri, admin.token()).await;
    assert_status!(response, StatusCode::NO_CONTENT);

    let response = app.delete(&uri, admin.token()).await;
    assert_error!(response, StatusCode::NOT_FOUND, "Conversation not found");

    let threads = app.get("/api/chats/threads", reader.token()).await;
    assert_eq!(threads.body, json!([]));
}

#[tokio::test]
async fn test_chat_routes_require_token() {
    let app = TestApp::new();

    let response = app.get("/api/chats/threads", None).await;
    assert_error!(response, StatusCode::UNAUTHORIZED, "Not authorized, no token");

    let response = app.get("/api/chats/limit", Some("garbage")).await;
    assert_error!(response, StatusCode::UNAUTHORIZED, "Not authorized, token failed");
}
