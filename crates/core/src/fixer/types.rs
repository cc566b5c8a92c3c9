//! Engine request/response types.

use serde::{Deserialize, Serialize};

use crate::campaign::{EngagementMetrics, OrderCounters};
use crate::snapshot::UpstreamStatus;

/// Fully resolved parameters for `create_campaign`.
///
/// Serialized as the engine's `create_campaign` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateCampaignParams {
    #[serde(rename = "video_url", skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(rename = "video_id")]
    pub target_id: String,
    #[serde(rename = "genre")]
    pub category: String,
    pub comments_source: String,
    pub wait_time: u32,
    #[serde(rename = "min_engagement")]
    pub minimum_engagement: u32,
    pub comment_server_id: u32,
    pub like_server_id: u32,
    pub tier: String,
}

/// Progress of an engine campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub metrics: EngagementMetrics,
    pub counters: OrderCounters,
    pub status: UpstreamStatus,
}

/// Engine acknowledgement of a stop request (opaque payload).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StopAck {
    pub payload: serde_json::Value,
}

/// Result of the liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineHealth {
    Healthy,
    /// The engine answered with a non-2xx status.
    Unhealthy { status: u16, body: String },
    /// No answer within the probe deadline.
    Unreachable(String),
}

impl EngineHealth {
    pub fn is_available(&self) -> bool {
        matches!(self, EngineHealth::Healthy)
    }
}

// Engine wire types

#[derive(Debug, Deserialize)]
pub(super) struct CreateCampaignResponse {
    #[serde(alias = "id")]
    pub campaign_id: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(super) struct CampaignStatusResponse {
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ordered_likes: u64,
    #[serde(default)]
    pub ordered_comments: u64,
    #[serde(default)]
    pub desired_likes: u64,
    #[serde(default)]
    pub desired_comments: u64,
}

impl From<CampaignStatusResponse> for EngineStatus {
    fn from(r: CampaignStatusResponse) -> Self {
        Self {
            metrics: EngagementMetrics {
                views: r.views,
                likes: r.likes,
                comments: r.comments,
            },
            counters: OrderCounters {
                ordered_likes: r.ordered_likes,
                ordered_comments: r.ordered_comments,
                desired_likes: r.desired_likes,
                desired_comments: r.desired_comments,
            },
            status: r
                .status
                .map(UpstreamStatus::from)
                .unwrap_or(UpstreamStatus::InProgress),
        }
    }
}
