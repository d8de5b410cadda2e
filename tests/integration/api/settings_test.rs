//! Site settings API integration tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{create_test_user, TestApp};
use crate::{assert_error, assert_status};

#[tokio::test]
async fn test_settings_upsert_by_key() {
    let app = TestApp::new();
    let admin = create_test_user(&app, "founder").await;

    let response = app.get("/api/settings", None).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body, json!([]));

    let response = app
        .put(
            "/api/settings",
            admin.token(),
            Some(json!([
                { "key": "banner", "value": "/files/banner.png", "mediaType": "image" },
                { "key": "theme_song", "value": "/files/song.mp3", "mediaType": "audio" },
            ])),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 2);

    let response = app
        .put(
            "/api/settings",
            admin.token(),
            Some(json!([{ "key": "banner", "value": "/files/banner-2.png", "mediaType": "image" }])),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let listed = app.get("/api/settings", None).await;
    let settings = listed.body.as_array().unwrap().clone();
    assert_eq!(settings.len(), 2);
    let banner = settings.iter().find(|s| s["key"] == "banner").unwrap();
    assert_eq!(banner["value"], "/files/banner-2.png");
    assert_eq!(banner["mediaType"], "image");
}

#[tokio::test]
async fn test_settings_update_is_admin_only() {
    let app = TestApp::new();
    let admin = create_test_user(&app, "founder").await;
    let reader = create_test_user(&app, "reader").await;
    let body = json!([{ "key": "banner", "value": "/files/b.png", "mediaType": "image" }]);

    let response = app.put("/api/settings", None, Some(body.clone())).await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    let response = app.put("/api/settings", reader.token(), Some(body)).await;
    assert_status!(response, StatusCode::FORBIDDEN);

    let response = app
        .put("/api/settings", admin.token(), Some(json!({ "key": "banner" })))
        .await;
    assert_error!(
        response,
        StatusCode::BAD_REQUEST,
        "Request body must be an array of settings."
    );

    let response = app
        .put(
            "/api/settings",
            admin.token(),
            Some(json!([{ "key": "", "value": "x", "mediaType": "image" }])),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}
