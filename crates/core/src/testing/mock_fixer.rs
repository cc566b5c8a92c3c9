//! Mock ordering engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::campaign::{EngagementMetrics, OrderCounters};
use crate::fixer::{
    CreateCampaignParams, EngineHealth, EngineStatus, FixerClient, FixerError, StopAck,
};
use crate::snapshot::UpstreamStatus;

/// A recorded engine call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum FixerCall {
    Create(CreateCampaignParams),
    FetchStatus(String),
    Stop(String),
    HealthCheck,
}

/// Mock implementation of the FixerClient trait.
///
/// Provides controllable behavior for testing:
/// - Sequential engine ids (`ext-1`, `ext-2`, ...)
/// - Programmable status per engine campaign
/// - Failure injection per operation and slow status and stop calls
/// - Call recording
///
/// # Example
///
/// ```rust,ignore
/// use fixer_core::testing::MockFixerClient;
///
/// let fixer = MockFixerClient::new();
/// fixer.set_counters("ext-1", OrderCounters { ordered_likes: 5, ..Default::default() }).await;
/// fixer.set_stop_error(Some(FixerError::unavailable("down"))).await;
///
/// // ... drive the bridge ...
///
/// assert_eq!(fixer.create_count().await, 1);
/// ```
pub struct MockFixerClient {
    next_id: AtomicU64,
    /// Known engine campaigns and what a status call reports for them.
    campaigns: Arc<RwLock<HashMap<String, EngineStatus>>>,
    calls: Arc<RwLock<Vec<FixerCall>>>,
    create_error: Arc<RwLock<Option<FixerError>>>,
    status_error: Arc<RwLock<Option<FixerError>>>,
    stop_error: Arc<RwLock<Option<FixerError>>>,
    status_delay: Arc<RwLock<Option<Duration>>>,
    stop_delay: Arc<RwLock<Option<Duration>>>,
    health: Arc<RwLock<EngineHealth>>,
}

impl std::fmt::Debug for MockFixerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockFixerClient")
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .field("campaigns", &"<campaigns>")
            .field("calls", &"<calls>")
            .finish()
    }
}

impl Default for MockFixerClient {
    fn default() -> Self {
        Self::new()
    }
}

fn initial_status() -> EngineStatus {
    EngineStatus {
        metrics: EngagementMetrics::default(),
        counters: OrderCounters::default(),
        status: UpstreamStatus::InProgress,
    }
}

impl MockFixerClient {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            campaigns: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            create_error: Arc::new(RwLock::new(None)),
            status_error: Arc::new(RwLock::new(None)),
            stop_error: Arc::new(RwLock::new(None)),
            status_delay: Arc::new(RwLock::new(None)),
            stop_delay: Arc::new(RwLock::new(None)),
            health: Arc::new(RwLock::new(EngineHealth::Healthy)),
        }
    }

    /// Set what a status call reports for an engine campaign.
    ///
    /// Also makes the campaign known to the mock engine.
    pub async fn set_status(&self, external_id: &str, status: EngineStatus) {
        self.campaigns
            .write()
            .await
            .insert(external_id.to_string(), status);
    }

    /// Replace only the order counters reported for an engine campaign.
    pub async fn set_counters(&self, external_id: &str, counters: OrderCounters) {
        self.campaigns
            .write()
            .await
            .entry(external_id.to_string())
            .or_insert_with(initial_status)
            .counters = counters;
    }

    /// Forget an engine campaign so status calls return 404.
    pub async fn remove_campaign(&self, external_id: &str) {
        self.campaigns.write().await.remove(external_id);
    }

    /// Make every create call fail (None to clear).
    pub async fn set_create_error(&self, error: Option<FixerError>) {
        *self.create_error.write().await = error;
    }

    /// Make every status call fail (None to clear).
    pub async fn set_status_error(&self, error: Option<FixerError>) {
        *self.status_error.write().await = error;
    }

    /// Make every stop call fail (None to clear).
    pub async fn set_stop_error(&self, error: Option<FixerError>) {
        *self.stop_error.write().await = error;
    }

    /// Delay status responses, to exercise cancellation.
    pub async fn set_status_delay(&self, delay: Option<Duration>) {
        *self.status_delay.write().await = delay;
    }

    /// Delay stop calls. The call is recorded before the delay.
    pub async fn set_stop_delay(&self, delay: Option<Duration>) {
        *self.stop_delay.write().await = delay;
    }

    pub async fn set_health(&self, health: EngineHealth) {
        *self.health.write().await = health;
    }

    /// Get recorded calls in order.
    pub async fn calls(&self) -> Vec<FixerCall> {
        self.calls.read().await.clone()
    }

    pub async fn create_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| matches!(call, FixerCall::Create(_)))
            .count()
    }

    /// Engine ids passed to stop calls, in order.
    pub async fn stopped_ids(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|call| match call {
                FixerCall::Stop(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: FixerCall) {
        self.calls.write().await.push(call);
    }
}

#[async_trait]
impl FixerClient for MockFixerClient {
    async fn create_campaign(&self, params: &CreateCampaignParams) -> Result<String, FixerError> {
        self.record(FixerCall::Create(params.clone())).await;
        if let Some(error) = self.create_error.read().await.clone() {
            return Err(error);
        }

        let id = format!("ext-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        // Statuses scripted before the create call are kept.
        self.campaigns
            .write()
            .await
            .entry(id.clone())
            .or_insert_with(|| EngineStatus {
                status: UpstreamStatus::Started,
                ..initial_status()
            });
        Ok(id)
    }

    async fn fetch_status(&self, external_id: &str) -> Result<EngineStatus, FixerError> {
        self.record(FixerCall::FetchStatus(external_id.to_string()))
            .await;

        let delay = *self.status_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.status_error.read().await.clone() {
            return Err(error);
        }

        self.campaigns
            .read()
            .await
            .get(external_id)
            .cloned()
            .ok_or_else(|| FixerError::NotFound {
                external_id: external_id.to_string(),
                body: "campaign not found".to_string(),
            })
    }

    async fn stop_campaign(&self, external_id: &str) -> Result<StopAck, FixerError> {
        self.record(FixerCall::Stop(external_id.to_string())).await;

        let delay = *self.stop_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.stop_error.read().await.clone() {
            return Err(error);
        }

        if let Some(status) = self.campaigns.write().await.get_mut(external_id) {
            status.status = UpstreamStatus::Stopped;
        }
        Ok(StopAck {
            payload: serde_json::json!({ "campaign_id": external_id, "status": "stopped" }),
        })
    }

    async fn health_check(&self) -> EngineHealth {
        self.record(FixerCall::HealthCheck).await;
        self.health.read().await.clone()
    }
}
