//! Campaign record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Engagement observed on the target content item.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngagementMetrics {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
}

/// Counters captured when a campaign enters `Running`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Baseline {
    pub likes: u64,
    pub comments: u64,
}

impl Baseline {
    pub fn from_metrics(metrics: &EngagementMetrics) -> Self {
        Self {
            likes: metrics.likes,
            comments: metrics.comments,
        }
    }
}

/// Order progress as reported by the ordering engine.
///
/// The engine is the source of truth for these four values; merges overwrite.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderCounters {
    pub ordered_likes: u64,
    pub ordered_comments: u64,
    pub desired_likes: u64,
    pub desired_comments: u64,
}

/// Lifecycle of a locally tracked campaign.
///
/// ```text
/// NotStarted -> Running -> Stopped
///                  ^          |
///                  +----------+  (restart)
/// ```
///
/// The external id lives inside the started states, so a record can only
/// carry an external id once `start` has succeeded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum LifecycleState {
    NotStarted,
    Running {
        external_id: String,
        started_at: DateTime<Utc>,
    },
    Stopped {
        external_id: String,
        stopped_at: DateTime<Utc>,
    },
}

impl LifecycleState {
    /// Identifier assigned by the ordering engine, if the campaign was ever started.
    pub fn external_id(&self) -> Option<&str> {
        match self {
            LifecycleState::NotStarted => None,
            LifecycleState::Running { external_id, .. }
            | LifecycleState::Stopped { external_id, .. } => Some(external_id),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, LifecycleState::Running { .. })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, LifecycleState::Stopped { .. })
    }

    /// Name stored in the `state` column and used in metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::NotStarted => "not_started",
            LifecycleState::Running { .. } => "running",
            LifecycleState::Stopped { .. } => "stopped",
        }
    }
}

/// One locally tracked campaign.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    pub id: String,
    pub name: Option<String>,
    pub state: LifecycleState,
    /// Latest engagement known locally (pushed by scrapers, not by the engine).
    pub metrics: EngagementMetrics,
    /// Set at the Running transition and left alone until the next start.
    pub baseline: Option<Baseline>,
    pub counters: OrderCounters,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CampaignRecord {
    pub fn external_id(&self) -> Option<&str> {
        self.state.external_id()
    }

    /// Likes gained since the baseline was captured.
    pub fn likes_gained(&self) -> Option<u64> {
        self.baseline
            .map(|b| self.metrics.likes.saturating_sub(b.likes))
    }

    /// Comments gained since the baseline was captured.
    pub fn comments_gained(&self) -> Option<u64> {
        self.baseline
            .map(|b| self.metrics.comments.saturating_sub(b.comments))
    }
}
