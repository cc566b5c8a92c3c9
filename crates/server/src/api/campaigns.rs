//! Local campaign API handlers.
//!
//! Campaign records are created here (or lazily by `start`), fed engagement
//! metrics by scrapers, and polled by local id.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use fixer_core::{
    CampaignRecord, EngagementMetrics, EngineStatus, NewCampaign, OrderCounters, Snapshot,
    SnapshotWrite, UpstreamStatus,
};

use super::error::ApiError;
use crate::state::AppState;

/// Maximum allowed limit for list queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for list queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for registering a campaign
#[derive(Debug, Deserialize)]
pub struct CreateCampaignBody {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
}

/// Query parameters for paginated lists
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Campaign as returned by the API, with gains since the baseline.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResponse {
    #[serde(flatten)]
    pub record: CampaignRecord,
    pub likes_gained: Option<u64>,
    pub comments_gained: Option<u64>,
}

impl From<CampaignRecord> for CampaignResponse {
    fn from(record: CampaignRecord) -> Self {
        Self {
            likes_gained: record.likes_gained(),
            comments_gained: record.comments_gained(),
            record,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListCampaignsResponse {
    pub campaigns: Vec<CampaignResponse>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub campaign: CampaignResponse,
    pub status: EngineStatusBody,
    pub snapshot: SnapshotWrite,
}

/// Engine-reported status, flattened for JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatusBody {
    #[serde(flatten)]
    pub metrics: EngagementMetrics,
    #[serde(flatten)]
    pub counters: OrderCounters,
    pub status: UpstreamStatus,
}

impl From<EngineStatus> for EngineStatusBody {
    fn from(status: EngineStatus) -> Self {
        Self {
            metrics: status.metrics,
            counters: status.counters,
            status: status.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SnapshotsResponse {
    pub snapshots: Vec<Snapshot>,
    pub total: i64,
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a campaign
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateCampaignBody>, JsonRejection>,
) -> Result<(StatusCode, Json<CampaignResponse>), ApiError> {
    let Json(body) = body?;

    let id = body.id.trim();
    if id.is_empty() {
        return Err(ApiError::bad_request("id is required"));
    }

    let mut campaign = NewCampaign::new(id).with_metrics(EngagementMetrics {
        views: body.views,
        likes: body.likes,
        comments: body.comments,
    });
    if let Some(name) = body.name {
        campaign = campaign.with_name(name);
    }

    let record = state.campaigns().create(campaign)?;
    info!(campaign_id = %record.id, "Campaign registered");

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// List campaigns, most recently updated first
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListCampaignsResponse>, ApiError> {
    let Query(params) = params?;
    let limit = clamp_limit(params.limit);
    let offset = params.offset.unwrap_or(0).max(0);

    let campaigns = state
        .campaigns()
        .list(limit, offset)?
        .into_iter()
        .map(CampaignResponse::from)
        .collect();

    Ok(Json(ListCampaignsResponse {
        campaigns,
        limit,
        offset,
    }))
}

/// Get one campaign
pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CampaignResponse>, ApiError> {
    state
        .campaigns()
        .get(&id)?
        .map(|record| Json(record.into()))
        .ok_or_else(|| ApiError::not_found(format!("Campaign not found: {}", id)))
}

/// Replace the locally observed engagement metrics
pub async fn update_metrics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<EngagementMetrics>, JsonRejection>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let Json(metrics) = body?;
    let record = state.campaigns().update_metrics(&id, metrics)?;
    Ok(Json(record.into()))
}

/// Pull engine progress by local id
pub async fn poll_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PollResponse>, ApiError> {
    let outcome = state.synchronizer().poll(&id).await?;
    Ok(Json(PollResponse {
        campaign: outcome.record.into(),
        status: outcome.status.into(),
        snapshot: outcome.snapshot,
    }))
}

/// Snapshot history, oldest first
pub async fn list_snapshots(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<SnapshotsResponse>, ApiError> {
    let Query(params) = params?;
    if state.campaigns().get(&id)?.is_none() {
        return Err(ApiError::not_found(format!("Campaign not found: {}", id)));
    }

    let snapshots = state.snapshots().list(&id, clamp_limit(params.limit))?;
    let total = state.snapshots().count(&id)?;
    Ok(Json(SnapshotsResponse { snapshots, total }))
}
