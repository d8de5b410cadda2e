//! Test application
//!
//! Builds the full router over in-memory stores and sends requests to it
//! with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use imnovel::backend::messaging::{Clock, ManualClock};
use imnovel::backend::routes::create_router;
use imnovel::backend::server::{AppState, ServerConfig};

/// Response status plus the body as JSON
///
/// A body that is not JSON is kept as a JSON string; an empty body is `null`.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    router: Router,
}

pub fn test_config() -> ServerConfig {
    ServerConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some("integration-test-secret".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        "QUOTA_UTC_OFFSET_MINUTES" => Some("0".to_string()),
        _ => None,
    })
    .expect("test configuration")
}

impl TestApp {
    /// Fresh app whose clock starts at 2024-03-01 09:00 UTC
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        let state = AppState::in_memory(&test_config()).with_clock(clock.clone() as Arc<dyn Clock>);
        let router = create_router(state.clone());

        Self {
            state,
            clock,
            router,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        self.request(Method::PUT, uri, token, body).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }
}
