//! Engagement-ordering bridge.
//!
//! Mirrors campaigns running on the external ordering engine:
//! - [`LifecycleController`] starts and stops engine campaigns and owns
//!   baseline capture.
//! - [`StatusSynchronizer`] pulls engine progress into the local record and
//!   feeds the snapshot time series through the [`SnapshotThrottle`].
//!
//! All operations on one campaign are serialized through [`CampaignLocks`];
//! different campaigns proceed in parallel.

mod lifecycle;
mod locks;
mod sync;

pub use lifecycle::{LifecycleController, StartOutcome, StartParams, StopOutcome};
pub use locks::{CampaignGuard, CampaignLocks};
pub use sync::{PollOutcome, StatusSynchronizer};

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::campaign::CampaignStore;
use crate::clock::Clock;
use crate::config::OrderDefaults;
use crate::error::StoreError;
use crate::fixer::{FixerClient, FixerError};
use crate::metrics::{SNAPSHOTS_WRITTEN, SNAPSHOT_WRITE_FAILURES};
use crate::snapshot::{NewSnapshot, Snapshot, SnapshotStore};
use crate::throttle::SnapshotThrottle;

/// Errors surfaced by lifecycle and poll operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Missing or malformed input. Never retried.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// `start` on a campaign that is already running.
    #[error("Campaign {campaign_id} is already running as {external_id}")]
    AlreadyRunning {
        campaign_id: String,
        external_id: String,
    },

    /// Unknown campaign, campaign never started, or unknown to the engine.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The ordering engine failed or could not be reached.
    #[error("Ordering engine unavailable: {message}")]
    UpstreamUnavailable {
        status: Option<u16>,
        body: Option<String>,
        message: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A detached step was aborted before finishing (runtime shutdown).
    #[error("Interrupted: {0}")]
    Interrupted(String),
}

impl From<FixerError> for BridgeError {
    fn from(e: FixerError) -> Self {
        match e {
            FixerError::NotFound { external_id, .. } => {
                BridgeError::NotFound(format!("engine campaign {} does not exist", external_id))
            }
            FixerError::Unavailable {
                status,
                body,
                message,
            } => BridgeError::UpstreamUnavailable {
                status,
                body,
                message,
            },
            FixerError::Configuration(message) => BridgeError::UpstreamUnavailable {
                status: None,
                body: None,
                message,
            },
        }
    }
}

/// What happened to the snapshot an operation tried to persist.
///
/// Snapshots are telemetry: a failed write never fails the enclosing
/// operation, it is reported here instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum SnapshotWrite {
    Written(Snapshot),
    /// The throttle window for this campaign is still open.
    Throttled,
    /// Nothing is written for this campaign state (e.g. polling a stopped campaign).
    Skipped,
    Failed(String),
}

impl SnapshotWrite {
    pub fn is_written(&self) -> bool {
        matches!(self, SnapshotWrite::Written(_))
    }
}

/// Collaborators shared by the lifecycle controller and the synchronizer.
pub struct BridgeContext {
    fixer: Arc<dyn FixerClient>,
    campaigns: Arc<dyn CampaignStore>,
    snapshots: Arc<dyn SnapshotStore>,
    throttle: Arc<SnapshotThrottle>,
    clock: Arc<dyn Clock>,
    defaults: OrderDefaults,
    locks: CampaignLocks,
}

impl BridgeContext {
    pub fn new(
        fixer: Arc<dyn FixerClient>,
        campaigns: Arc<dyn CampaignStore>,
        snapshots: Arc<dyn SnapshotStore>,
        throttle: Arc<SnapshotThrottle>,
        clock: Arc<dyn Clock>,
        defaults: OrderDefaults,
    ) -> Self {
        Self {
            fixer,
            campaigns,
            snapshots,
            throttle,
            clock,
            defaults,
            locks: CampaignLocks::new(),
        }
    }

    pub fn fixer(&self) -> &Arc<dyn FixerClient> {
        &self.fixer
    }

    pub fn campaigns(&self) -> &Arc<dyn CampaignStore> {
        &self.campaigns
    }

    pub fn snapshots(&self) -> &Arc<dyn SnapshotStore> {
        &self.snapshots
    }

    pub fn throttle(&self) -> &Arc<SnapshotThrottle> {
        &self.throttle
    }

    pub fn defaults(&self) -> &OrderDefaults {
        &self.defaults
    }

    pub fn locks(&self) -> &CampaignLocks {
        &self.locks
    }

    /// Append a snapshot, reporting failure instead of propagating it.
    fn write_snapshot(&self, snapshot: NewSnapshot, reason: &'static str) -> SnapshotWrite {
        let campaign_id = snapshot.campaign_id.clone();
        match self.snapshots.append(snapshot) {
            Ok(written) => {
                SNAPSHOTS_WRITTEN.with_label_values(&[reason]).inc();
                SnapshotWrite::Written(written)
            }
            Err(e) => {
                SNAPSHOT_WRITE_FAILURES.inc();
                warn!(
                    campaign_id = %campaign_id,
                    reason = reason,
                    error = %e,
                    "Failed to persist snapshot"
                );
                SnapshotWrite::Failed(e.to_string())
            }
        }
    }
}
