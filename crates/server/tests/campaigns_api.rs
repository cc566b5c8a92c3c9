//! Local campaign routes under `/api/v1`.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestFixture};

#[tokio::test]
async fn test_health_and_config() {
    let fixture = TestFixture::with_api_key("dash-key");

    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("ok"));

    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body["auth"], "method", json!("api_key"));
    assert!(!response.text.contains("dash-key"));
    assert!(!response.text.contains("engine-secret"));

    let response = fixture.get_anonymous("/api/v1/config").await;
    assert_status!(response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_get_campaign() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/api/v1/campaigns",
            json!({ "id": "c1", "name": "Launch", "views": 900, "likes": 40, "comments": 4 }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    assert_json_path!(response.body, "id", json!("c1"));
    assert_json_path!(response.body, "name", json!("Launch"));
    assert_json_path!(response.body["state"], "type", json!("not_started"));
    assert_json_path!(response.body, "likesGained", json!(null));

    let response = fixture.get("/api/v1/campaigns/c1").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body["metrics"], "likes", json!(40));
}

#[tokio::test]
async fn test_create_duplicate_conflicts() {
    let fixture = TestFixture::new();
    fixture
        .post("/api/v1/campaigns", json!({ "id": "c1" }))
        .await;

    let response = fixture
        .post("/api/v1/campaigns", json!({ "id": "c1" }))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_requires_id() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/v1/campaigns", json!({ "id": "  " }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = fixture.post_raw("/api/v1/campaigns", "not json").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_unknown_campaign() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/campaigns/nope").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert_json_path!(response.body, "success", json!(false));
}

#[tokio::test]
async fn test_list_campaigns_paginates() {
    let fixture = TestFixture::new();
    for id in ["a", "b", "c"] {
        fixture
            .post("/api/v1/campaigns", json!({ "id": id }))
            .await;
    }

    let response = fixture.get("/api/v1/campaigns?limit=2").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["campaigns"].as_array().unwrap().len(), 2);
    assert_json_path!(response.body, "limit", json!(2));

    let response = fixture.get("/api/v1/campaigns?limit=2&offset=2").await;
    assert_eq!(response.body["campaigns"].as_array().unwrap().len(), 1);

    let response = fixture.get("/api/v1/campaigns?limit=abc").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_update_feeds_baseline_and_gains() {
    let fixture = TestFixture::new();
    fixture
        .post("/api/v1/campaigns", json!({ "id": "c1" }))
        .await;

    let response = fixture
        .put(
            "/api/v1/campaigns/c1/metrics",
            json!({ "views": 1000, "likes": 50, "comments": 5 }),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    fixture.start_campaign("c1").await;
    fixture
        .put(
            "/api/v1/campaigns/c1/metrics",
            json!({ "views": 1500, "likes": 72, "comments": 9 }),
        )
        .await;

    let response = fixture.get("/api/v1/campaigns/c1").await;
    assert_json_path!(response.body["baseline"], "likes", json!(50));
    assert_json_path!(response.body, "likesGained", json!(22));
    assert_json_path!(response.body, "commentsGained", json!(4));
}

#[tokio::test]
async fn test_metrics_update_unknown_campaign() {
    let fixture = TestFixture::new();

    let response = fixture
        .put(
            "/api/v1/campaigns/nope/metrics",
            json!({ "views": 1, "likes": 1, "comments": 1 }),
        )
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_poll_by_local_id_and_history() {
    let fixture = TestFixture::new();
    let external_id = fixture.start_campaign("c1").await;
    fixture
        .fixer
        .set_counters(&external_id, fixtures::counters(12, 2, 60, 6))
        .await;

    let response = fixture.post_empty("/api/v1/campaigns/c1/poll").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body["snapshot"], "result", json!("written"));
    assert_json_path!(response.body["status"], "orderedLikes", json!(12));
    assert_json_path!(response.body["campaign"]["counters"], "desiredLikes", json!(60));

    // Second poll inside the window is throttled but still merges.
    fixture.clock.advance(Duration::from_secs(30));
    let response = fixture.post_empty("/api/v1/campaigns/c1/poll").await;
    assert_json_path!(response.body["snapshot"], "result", json!("throttled"));

    let response = fixture.get("/api/v1/campaigns/c1/snapshots").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "total", json!(2));
    let snapshots = response.body["snapshots"].as_array().unwrap();
    assert_eq!(snapshots[0]["upstreamStatus"], json!("started"));
    assert_eq!(snapshots[1]["orderedLikes"], json!(12));
}

#[tokio::test]
async fn test_poll_not_started_campaign() {
    let fixture = TestFixture::new();
    fixture
        .post("/api/v1/campaigns", json!({ "id": "idle" }))
        .await;

    let response = fixture.post_empty("/api/v1/campaigns/idle/poll").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_snapshots_unknown_campaign() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/campaigns/nope/snapshots").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::with_api_key("dash-key");
    fixture.get("/api/v1/health").await;

    let response = fixture.get_anonymous("/metrics").await;
    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("fixer_http_requests_total"));
    assert!(response.text.contains("fixer_throttle_windows_open"));
}
