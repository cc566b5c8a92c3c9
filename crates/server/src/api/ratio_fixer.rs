//! Ratio-fixer routes used by the dashboard.
//!
//! These are mounted at `/ratio-fixer` and address campaigns by the id the
//! ordering engine assigned, except for `start` which takes the local id.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use fixer_core::{EngineHealth, StartParams, UpstreamStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use super::middleware::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for starting a campaign
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartBody {
    #[serde(default)]
    pub campaign_id: String,
    #[serde(flatten)]
    pub params: StartParams,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub success: bool,
    pub external_campaign_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub status: UpstreamStatus,
    pub desired_likes: u64,
    pub desired_comments: u64,
    pub ordered_likes: u64,
    pub ordered_comments: u64,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub success: bool,
    pub message: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a campaign on the ordering engine
pub async fn start(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    body: Result<Json<StartBody>, JsonRejection>,
) -> Result<Json<StartResponse>, ApiError> {
    let Json(body) = body?;

    let outcome = state
        .lifecycle()
        .start(&body.campaign_id, body.params)
        .await?;

    info!(
        user = %user,
        campaign_id = %outcome.record.id,
        external_id = %outcome.external_id,
        "Campaign start requested"
    );

    Ok(Json(StartResponse {
        success: true,
        message: format!("Campaign {} started", outcome.record.id),
        external_campaign_id: outcome.external_id,
    }))
}

/// Pull engine progress for a running campaign
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let outcome = state.synchronizer().poll_external(&external_id).await?;
    let status = outcome.status;

    Ok(Json(StatusResponse {
        views: status.metrics.views,
        likes: status.metrics.likes,
        comments: status.metrics.comments,
        status: status.status,
        desired_likes: status.counters.desired_likes,
        desired_comments: status.counters.desired_comments,
        ordered_likes: status.counters.ordered_likes,
        ordered_comments: status.counters.ordered_comments,
    }))
}

/// Stop a campaign on the ordering engine
pub async fn stop(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(external_id): Path<String>,
) -> Result<Json<StopResponse>, ApiError> {
    let outcome = state.lifecycle().stop_external(&external_id).await?;

    info!(
        user = %user,
        campaign_id = %outcome.record.id,
        external_id = %external_id,
        "Campaign stop requested"
    );

    Ok(Json(StopResponse {
        success: true,
        message: format!("Campaign {} stopped", outcome.record.id),
        data: outcome.upstream.payload,
    }))
}

/// Ordering engine liveness
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    match state.fixer().health_check().await {
        EngineHealth::Healthy => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                available: true,
                error: None,
            }),
        ),
        EngineHealth::Unhealthy { status, body } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                available: false,
                error: Some(format!("engine returned HTTP {}: {}", status, body)),
            }),
        ),
        EngineHealth::Unreachable(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unreachable",
                available: false,
                error: Some(reason),
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_body_flattens_params() {
        let body: StartBody = serde_json::from_value(serde_json::json!({
            "campaignId": "c1",
            "targetUrl": "https://video.example/v1",
            "targetId": "v1",
            "category": "music",
            "commentsSource": "curated",
            "waitTime": 12
        }))
        .unwrap();

        assert_eq!(body.campaign_id, "c1");
        assert_eq!(body.params.target_id.as_deref(), Some("v1"));
        assert_eq!(body.params.comments_source.as_deref(), Some("curated"));
        assert_eq!(body.params.wait_time, Some(12));
        assert_eq!(body.params.tier, None);
    }

    #[test]
    fn test_status_response_is_camel_case() {
        let response = StatusResponse {
            views: 100,
            likes: 10,
            comments: 2,
            status: UpstreamStatus::InProgress,
            desired_likes: 50,
            desired_comments: 5,
            ordered_likes: 20,
            ordered_comments: 1,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["desiredLikes"], 50);
        assert_eq!(json["orderedComments"], 1);
    }
}
