//! Account API integration tests
//!
//! Registration, login, profile, roles, allies and deletion through
//! `/api/users`, plus the liveness routes.

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{create_cast, create_test_user, login, TestApp, TEST_PASSWORD};
use crate::{assert_error, assert_status};

#[tokio::test]
async fn test_liveness_routes() {
    let app = TestApp::new();

    let root = app.get("/", None).await;
    assert_status!(root, StatusCode::OK);
    assert!(root.body.as_str().unwrap().contains("IMnovel"));

    let api = app.get("/api", None).await;
    assert_eq!(api.body, "API is running...");

    let missing = app.get("/api/nowhere", None).await;
    assert_status!(missing, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_first_user_is_admin() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/users/register",
            None,
            json!({ "username": "founder", "email": "founder@example.com", "password": TEST_PASSWORD }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["user"]["role"], "admin");
    assert_eq!(response.body["user"]["race"], "Tổng lãnh thiên thần");
    assert!(response.body["user"].get("passwordHash").is_none());
    assert!(response.body.get("token").is_none());

    let response = app
        .post(
            "/api/users/register",
            None,
            json!({ "username": "reader", "email": "reader@example.com", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(response.body["user"]["role"], "user");
    assert_eq!(response.body["user"]["race"], "Nhân tộc");
}

#[tokio::test]
async fn test_register_rejections() {
    let app = TestApp::new();
    create_test_user(&app, "reader").await;

    let response = app
        .post("/api/users/register", None, json!({ "username": "someone" }))
        .await;
    assert_error!(response, StatusCode::BAD_REQUEST, "Please add all fields");

    let response = app
        .post(
            "/api/users/register",
            None,
            json!({ "username": "reader", "email": "new@example.com", "password": TEST_PASSWORD }),
        )
        .await;
    assert_error!(response, StatusCode::BAD_REQUEST, "User already exists");
}

#[tokio::test]
async fn test_login_and_me() {
    let app = TestApp::new();
    let user = create_test_user(&app, "reader").await;

    // Email works as well as the username
    let by_email = login(&app, "reader@example.com").await;
    assert_eq!(by_email.id, user.id);

    let response = app
        .post(
            "/api/users/login",
            None,
            json!({ "loginIdentifier": "reader", "password": "wrong-password" }),
        )
        .await;
    assert_error!(response, StatusCode::UNAUTHORIZED, "Invalid credentials");

    let me = app.get("/api/users/me", user.token()).await;
    assert_status!(me, StatusCode::OK);
    assert_eq!(me.body["username"], "reader");
    assert_eq!(me.body["allyOf"], serde_json::Value::Null);

    let me = app.get("/api/users/me", None).await;
    assert_error!(me, StatusCode::UNAUTHORIZED, "Not authorized, no token");
}

#[tokio::test]
async fn test_profile_and_password() {
    let app = TestApp::new();
    let user = create_test_user(&app, "reader").await;
    create_test_user(&app, "other").await;

    let response = app
        .put(
            "/api/users/profile",
            user.token(),
            Some(json!({ "name": "Độc giả", "email": "" })),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["name"], "Độc giả");
    assert_eq!(response.body["email"], "reader@example.com");

    let response = app
        .put(
            "/api/users/profile",
            user.token(),
            Some(json!({ "email": "other@example.com" })),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = app
        .put(
            "/api/users/password",
            user.token(),
            Some(json!({ "oldPassword": "nope", "newPassword": "brand-new" })),
        )
        .await;
    assert_error!(response, StatusCode::UNAUTHORIZED, "Incorrect old password");

    let response = app
        .put(
            "/api/users/password",
            user.token(),
            Some(json!({ "oldPassword": TEST_PASSWORD, "newPassword": "brand-new" })),
        )
        .await;
    assert_status!(response, StatusCode::NO_CONTENT);

    let response = app
        .post(
            "/api/users/login",
            None,
            json!({ "loginIdentifier": "reader", "password": "brand-new" }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
}

#[tokio::test]
async fn test_directory_routes() {
    let app = TestApp::new();
    create_test_user(&app, "reader").await;

    let response = app
        .post("/api/users/check-username", None, json!({ "username": "reader" }))
        .await;
    assert_eq!(response.body, json!({ "available": false }));

    let response = app
        .post("/api/users/check-email", None, json!({ "email": "free@example.com" }))
        .await;
    assert_eq!(response.body, json!({ "available": true }));

    let response = app.get("/api/users/public", None).await;
    assert_status!(response, StatusCode::OK);
    let listed = response.body.as_array().unwrap().clone();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].get("email").is_none());
}

#[tokio::test]
async fn test_user_list_and_roles() {
    let app = TestApp::new();
    let (admin, contractor, reader) = create_cast(&app).await;

    let response = app.get("/api/users", reader.token()).await;
    assert_error!(
        response,
        StatusCode::FORBIDDEN,
        "You are not authorized to view the user list."
    );

    let response = app.get("/api/users", contractor.token()).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 3);

    let response = app
        .put(
            &format!("/api/users/{}/role", reader.id),
            contractor.token(),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_status!(response, StatusCode::FORBIDDEN);

    let response = app
        .put(
            &format!("/api/users/{}/role", reader.id),
            admin.token(),
            Some(json!({ "role": "overlord" })),
        )
        .await;
    assert_error!(response, StatusCode::BAD_REQUEST, "Invalid role specified.");

    let response = app
        .put(
            &format!("/api/users/{}/role", admin.id),
            admin.token(),
            Some(json!({ "role": "user" })),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_allies() {
    let app = TestApp::new();
    let (_admin, contractor, reader) = create_cast(&app).await;

    let response = app
        .put(
            "/api/users/manage-ally",
            reader.token(),
            Some(json!({ "action": "add", "allyUsername": "builder" })),
        )
        .await;
    assert_error!(response, StatusCode::FORBIDDEN, "Only contractors can manage allies.");

    let response = app
        .put(
            "/api/users/manage-ally",
            contractor.token(),
            Some(json!({ "action": "add", "allyUsername": "reader" })),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["allyOf"]["username"], "builder");

    let me = app.get("/api/users/me", reader.token()).await;
    assert_eq!(me.body["allyOf"]["id"], contractor.id.to_string());

    let response = app.put("/api/users/leave-ally", reader.token(), None).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["allyOf"], serde_json::Value::Null);

    let response = app.put("/api/users/leave-ally", reader.token(), None).await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_user() {
    let app = TestApp::new();
    let (admin, _contractor, reader) = create_cast(&app).await;

    app.post("/api/chats/send", reader.token(), json!({ "text": "bye" }))
        .await;

    let response = app
        .delete(&format!("/api/users/{}", admin.id), admin.token())
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = app
        .delete(&format!("/api/users/{}", reader.id), admin.token())
        .await;
    assert_status!(response, StatusCode::NO_CONTENT);

    let threads = app.get("/api/chats/threads", admin.token()).await;
    assert_eq!(threads.body, json!([]));

    // The deleted user's token no longer authenticates
    let response = app.get("/api/users/me", reader.token()).await;
    assert_error!(response, StatusCode::UNAUTHORIZED, "Not authorized, user not found");

    let response = app
        .delete(&format!("/api/users/{}", reader.id), admin.token())
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);
}
