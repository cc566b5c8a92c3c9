use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::{EngagementMetrics, OrderCounters};

/// Status tag carried by a snapshot.
///
/// The engine reports free text; the three values the bridge itself
/// produces or expects get their own variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UpstreamStatus {
    Started,
    InProgress,
    Stopped,
    Other(String),
}

impl UpstreamStatus {
    pub fn as_str(&self) -> &str {
        match self {
            UpstreamStatus::Started => "started",
            UpstreamStatus::InProgress => "in_progress",
            UpstreamStatus::Stopped => "stopped",
            UpstreamStatus::Other(s) => s,
        }
    }
}

impl From<&str> for UpstreamStatus {
    fn from(s: &str) -> Self {
        match s {
            "started" => UpstreamStatus::Started,
            "in_progress" => UpstreamStatus::InProgress,
            "stopped" => UpstreamStatus::Stopped,
            other => UpstreamStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for UpstreamStatus {
    fn from(s: String) -> Self {
        UpstreamStatus::from(s.as_str())
    }
}

impl From<UpstreamStatus> for String {
    fn from(status: UpstreamStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for UpstreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observation to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnapshot {
    pub campaign_id: String,
    pub observed_at: DateTime<Utc>,
    pub metrics: EngagementMetrics,
    pub counters: OrderCounters,
    pub upstream_status: UpstreamStatus,
}

/// A persisted observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: i64,
    pub campaign_id: String,
    pub observed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub metrics: EngagementMetrics,
    #[serde(flatten)]
    pub counters: OrderCounters,
    pub upstream_status: UpstreamStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(UpstreamStatus::from("started"), UpstreamStatus::Started);
        assert_eq!(UpstreamStatus::from("in_progress"), UpstreamStatus::InProgress);
        assert_eq!(UpstreamStatus::from("stopped"), UpstreamStatus::Stopped);
        assert_eq!(
            UpstreamStatus::from("paused"),
            UpstreamStatus::Other("paused".to_string())
        );
        assert_eq!(UpstreamStatus::from("paused").as_str(), "paused");
    }

    #[test]
    fn test_status_serializes_as_plain_string() {
        let json = serde_json::to_value(UpstreamStatus::InProgress).unwrap();
        assert_eq!(json, serde_json::json!("in_progress"));
    }
}
