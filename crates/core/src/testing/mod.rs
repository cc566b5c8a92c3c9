//! Testing utilities and mock implementations.
//!
//! Lets the bridge run end to end without a real ordering engine:
//! in-memory SQLite stores, a scripted engine and a manual clock.
//!
//! # Example
//!
//! ```rust,ignore
//! use fixer_core::testing::{fixtures, TestHarness};
//!
//! let harness = TestHarness::new();
//! let started = harness.lifecycle().start("c1", fixtures::start_params("v1", "pop")).await?;
//! harness.fixer.set_counters(&started.external_id, fixtures::counters(5, 0, 50, 10)).await;
//! harness.clock.advance(Duration::from_secs(10));
//! harness.synchronizer().poll("c1").await?;
//! ```

mod manual_clock;
mod mock_fixer;

pub use manual_clock::ManualClock;
pub use mock_fixer::{FixerCall, MockFixerClient};

use std::sync::Arc;

use crate::bridge::{BridgeContext, LifecycleController, StatusSynchronizer};
use crate::campaign::SqliteCampaignStore;
use crate::config::OrderDefaults;
use crate::error::StoreError;
use crate::snapshot::SqliteSnapshotStore;
use crate::throttle::{SnapshotThrottle, DEFAULT_SNAPSHOT_INTERVAL};

/// A bridge wired to in-memory stores, a mock engine and a manual clock.
pub struct TestHarness {
    pub fixer: Arc<MockFixerClient>,
    pub clock: Arc<ManualClock>,
    pub campaigns: Arc<SqliteCampaignStore>,
    pub snapshots: Arc<SqliteSnapshotStore>,
    pub throttle: Arc<SnapshotThrottle>,
    pub context: Arc<BridgeContext>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Harness with the default 300s throttle window.
    ///
    /// Panics if the in-memory database cannot be opened.
    pub fn new() -> Self {
        Self::try_with_throttle(SnapshotThrottle::new(DEFAULT_SNAPSHOT_INTERVAL))
            .expect("in-memory stores")
    }

    pub fn try_with_throttle(throttle: SnapshotThrottle) -> Result<Self, StoreError> {
        let fixer = Arc::new(MockFixerClient::new());
        let clock = Arc::new(ManualClock::default());
        let campaigns = Arc::new(SqliteCampaignStore::in_memory()?);
        let snapshots = Arc::new(SqliteSnapshotStore::in_memory()?);
        let throttle = Arc::new(throttle);

        let context = Arc::new(BridgeContext::new(
            fixer.clone(),
            campaigns.clone(),
            snapshots.clone(),
            throttle.clone(),
            clock.clone(),
            OrderDefaults::default(),
        ));

        Ok(Self {
            fixer,
            clock,
            campaigns,
            snapshots,
            throttle,
            context,
        })
    }

    pub fn lifecycle(&self) -> LifecycleController {
        LifecycleController::new(self.context.clone())
    }

    pub fn synchronizer(&self) -> StatusSynchronizer {
        StatusSynchronizer::new(self.context.clone())
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::bridge::StartParams;
    use crate::campaign::{EngagementMetrics, OrderCounters};
    use crate::fixer::EngineStatus;
    use crate::snapshot::UpstreamStatus;

    /// Start parameters with only the required fields set.
    pub fn start_params(target_id: &str, category: &str) -> StartParams {
        StartParams::new(target_id, category)
    }

    pub fn counters(
        ordered_likes: u64,
        ordered_comments: u64,
        desired_likes: u64,
        desired_comments: u64,
    ) -> OrderCounters {
        OrderCounters {
            ordered_likes,
            ordered_comments,
            desired_likes,
            desired_comments,
        }
    }

    pub fn metrics(views: u64, likes: u64, comments: u64) -> EngagementMetrics {
        EngagementMetrics {
            views,
            likes,
            comments,
        }
    }

    /// An in-progress engine status.
    pub fn engine_status(metrics: EngagementMetrics, counters: OrderCounters) -> EngineStatus {
        EngineStatus {
            metrics,
            counters,
            status: UpstreamStatus::InProgress,
        }
    }
}
