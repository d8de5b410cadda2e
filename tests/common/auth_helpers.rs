//! Authentication test helpers
//!
//! Provides utilities for registering test users through the API and
//! logging them in.

use serde_json::json;
use uuid::Uuid;

use super::app::TestApp;

pub const TEST_PASSWORD: &str = "password123";

/// Registered and logged-in test user
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

impl TestUser {
    pub fn token(&self) -> Option<&str> {
        Some(&self.token)
    }
}

/// Register `username` and log in
///
/// The first user registered in an app becomes its admin.
pub async fn create_test_user(app: &TestApp, username: &str) -> TestUser {
    let registered = app
        .post(
            "/api/users/register",
            None,
            json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": TEST_PASSWORD,
            }),
        )
        .await;
    assert_eq!(
        registered.status.as_u16(),
        201,
        "registration failed: {}",
        registered.body
    );

    login(app, username).await
}

pub async fn login(app: &TestApp, identifier: &str) -> TestUser {
    let response = app
        .post(
            "/api/users/login",
            None,
            json!({ "loginIdentifier": identifier, "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(response.status.as_u16(), 200, "login failed: {}", response.body);

    TestUser {
        id: response.body["user"]["id"]
            .as_str()
            .and_then(|id| id.parse().ok())
            .expect("user id in login response"),
        username: response.body["user"]["username"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        token: response.body["token"]
            .as_str()
            .expect("token in login response")
            .to_string(),
    }
}

/// Change `user`'s role as `admin`
pub async fn set_role(app: &TestApp, admin: &TestUser, user: &TestUser, role: &str) {
    let response = app
        .put(
            &format!("/api/users/{}/role", user.id),
            admin.token(),
            Some(json!({ "role": role })),
        )
        .await;
    assert_eq!(response.status.as_u16(), 204, "role change failed: {}", response.body);
}

/// An admin, a contractor and a standard user
pub async fn create_cast(app: &TestApp) -> (TestUser, TestUser, TestUser) {
    let admin = create_test_user(app, "founder").await;
    let contractor = create_test_user(app, "builder").await;
    let reader = create_test_user(app, "reader").await;
    set_role(app, &admin, &contractor, "contractor").await;
    (admin, contractor, reader)
}
