//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the full router over a
//! bridge wired to in-memory stores, a mock ordering engine and a manual
//! clock, so routes can be exercised without any external service.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use fixer_core::{
    ApiKeyAuthenticator, AuthConfig, AuthMethod, Authenticator, Config, DatabaseConfig,
    EngineConfig, NoneAuthenticator, OrderDefaults, ServerConfig, SnapshotConfig,
    testing::{ManualClock, MockFixerClient, TestHarness},
};
use fixer_server::state::AppState;

/// Re-export fixtures for test convenience
pub use fixer_core::testing::fixtures;

/// Test fixture for driving the router in-process.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_start() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/ratio-fixer/start", json!({
///         "campaignId": "c1", "targetId": "v1", "category": "music"
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Bridge internals (stores, throttle) for assertions
    pub harness: TestHarness,
    /// Mock ordering engine - script statuses and failures
    pub fixer: Arc<MockFixerClient>,
    /// Manual clock - move time across throttle windows
    pub clock: Arc<ManualClock>,
    /// Key to send on every request, when api_key auth is enabled
    api_key: Option<String>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

pub fn test_config(auth: AuthConfig) -> Config {
    Config {
        auth,
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        engine: EngineConfig {
            url: "http://127.0.0.1:5001".to_string(),
            api_key: "engine-secret".to_string(),
            api_key_header: "X-API-Key".to_string(),
            timeout_secs: 15,
            health_timeout_secs: 5,
        },
        snapshots: SnapshotConfig::default(),
        defaults: OrderDefaults::default(),
    }
}

impl TestFixture {
    /// Fixture with authentication disabled.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Fixture requiring `key` on protected routes. Requests sent through
    /// the fixture carry it automatically.
    pub fn with_api_key(key: &str) -> Self {
        Self::build(Some(key.to_string()))
    }

    fn build(api_key: Option<String>) -> Self {
        let harness = TestHarness::new();

        let (auth, authenticator): (AuthConfig, Arc<dyn Authenticator>) = match &api_key {
            Some(key) => (
                AuthConfig {
                    method: AuthMethod::ApiKey,
                    api_key: Some(key.clone()),
                },
                Arc::new(ApiKeyAuthenticator::new(key.clone())),
            ),
            None => (
                AuthConfig {
                    method: AuthMethod::None,
                    api_key: None,
                },
                Arc::new(NoneAuthenticator),
            ),
        };

        let state = Arc::new(AppState::new(
            test_config(auth),
            authenticator,
            harness.context.clone(),
        ));
        let router = fixer_server::api::create_router(state);

        Self {
            router,
            fixer: harness.fixer.clone(),
            clock: harness.clock.clone(),
            harness,
            api_key,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, true).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), true).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None, true).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body), true).await
    }

    /// Send a GET request without credentials.
    pub async fn get_anonymous(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, false).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let builder = self
            .authorize(Request::builder().method("POST").uri(path), true)
            .header("Content-Type", "application/json");
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Start a campaign through the API and return its engine id.
    pub async fn start_campaign(&self, campaign_id: &str) -> String {
        let response = self
            .post(
                "/ratio-fixer/start",
                serde_json::json!({
                    "campaignId": campaign_id,
                    "targetUrl": "https://video.example/watch/v1",
                    "targetId": "v1",
                    "category": "music",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "start failed: {}", response.text);
        response.body["externalCampaignId"]
            .as_str()
            .expect("externalCampaignId")
            .to_string()
    }

    fn authorize(
        &self,
        builder: axum::http::request::Builder,
        with_credentials: bool,
    ) -> axum::http::request::Builder {
        match (&self.api_key, with_credentials) {
            (Some(key), true) => builder.header("Authorization", format!("Bearer {}", key)),
            _ => builder,
        }
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        with_credentials: bool,
    ) -> TestResponse {
        let mut builder = self.authorize(
            Request::builder().method(method).uri(path),
            with_credentials,
        );

        let body = if let Some(json_body) = body {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
