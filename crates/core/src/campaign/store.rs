//! Campaign storage trait.

use chrono::{DateTime, Utc};

pub use crate::error::StoreError;

use super::{Baseline, CampaignRecord, EngagementMetrics, OrderCounters};

/// Request to register a campaign before it is started.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    /// Caller-supplied stable identifier.
    pub id: String,
    pub name: Option<String>,
    pub metrics: EngagementMetrics,
}

impl NewCampaign {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            metrics: EngagementMetrics::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_metrics(mut self, metrics: EngagementMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Persistent store of campaign records.
///
/// Lifecycle transitions are only issued by the lifecycle controller; every
/// write returns the record as it is after the write.
pub trait CampaignStore: Send + Sync {
    /// Register a new campaign. Fails with `Conflict` if the id is taken.
    fn create(&self, campaign: NewCampaign) -> Result<CampaignRecord, StoreError>;

    /// Get a campaign by local id.
    fn get(&self, id: &str) -> Result<Option<CampaignRecord>, StoreError>;

    /// Get a campaign, registering an empty `NotStarted` record if it is unknown.
    fn get_or_create(&self, id: &str) -> Result<CampaignRecord, StoreError>;

    /// Find the campaign mirrored by an engine-side campaign id.
    fn find_by_external_id(&self, external_id: &str)
        -> Result<Option<CampaignRecord>, StoreError>;

    /// List campaigns, most recently updated first.
    fn list(&self, limit: i64, offset: i64) -> Result<Vec<CampaignRecord>, StoreError>;

    /// Replace the locally observed engagement metrics.
    fn update_metrics(
        &self,
        id: &str,
        metrics: EngagementMetrics,
    ) -> Result<CampaignRecord, StoreError>;

    /// Enter `Running`: record the external id and baseline, reset order counters.
    fn mark_running(
        &self,
        id: &str,
        external_id: &str,
        baseline: Baseline,
        at: DateTime<Utc>,
    ) -> Result<CampaignRecord, StoreError>;

    /// Overwrite the four order counters and `last_checked_at`.
    fn merge_counters(
        &self,
        id: &str,
        counters: OrderCounters,
        checked_at: DateTime<Utc>,
    ) -> Result<CampaignRecord, StoreError>;

    /// Enter `Stopped`. Fails with `Conflict` if the campaign was never started.
    fn mark_stopped(&self, id: &str, at: DateTime<Utc>) -> Result<CampaignRecord, StoreError>;
}
