//! Pull engine progress into the local mirror.

use std::sync::Arc;

use tracing::debug;

use crate::campaign::CampaignRecord;
use crate::fixer::EngineStatus;
use crate::metrics::SNAPSHOTS_THROTTLED;
use crate::snapshot::NewSnapshot;

use super::{BridgeContext, BridgeError, SnapshotWrite};

/// Result of one status pull.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// Record after the counter merge.
    pub record: CampaignRecord,
    /// What the engine reported.
    pub status: EngineStatus,
    pub snapshot: SnapshotWrite,
}

/// Runs caller-driven status pulls. There is no internal timer.
#[derive(Clone)]
pub struct StatusSynchronizer {
    ctx: Arc<BridgeContext>,
}

impl StatusSynchronizer {
    pub fn new(ctx: Arc<BridgeContext>) -> Self {
        Self { ctx }
    }

    /// Pull status for a campaign by local id.
    ///
    /// On error nothing local changes. The snapshot is written only when the
    /// throttle window allows it and the campaign is not stopped.
    pub async fn poll(&self, campaign_id: &str) -> Result<PollOutcome, BridgeError> {
        self.poll_guarded(campaign_id, None).await
    }

    /// Pull status for the campaign mirrored by an engine campaign id.
    pub async fn poll_external(&self, external_id: &str) -> Result<PollOutcome, BridgeError> {
        let record = self
            .ctx
            .campaigns
            .find_by_external_id(external_id)?
            .ok_or_else(|| {
                BridgeError::NotFound(format!("no campaign tracks engine campaign {}", external_id))
            })?;
        self.poll_guarded(&record.id, Some(external_id)).await
    }

    async fn poll_guarded(
        &self,
        campaign_id: &str,
        expected_external_id: Option<&str>,
    ) -> Result<PollOutcome, BridgeError> {
        let _guard = self.ctx.locks.lock(campaign_id).await;

        let record = self
            .ctx
            .campaigns
            .get(campaign_id)?
            .ok_or_else(|| BridgeError::NotFound(format!("campaign {} not found", campaign_id)))?;
        let external_id = match (record.external_id(), expected_external_id) {
            (None, _) => {
                return Err(BridgeError::NotFound(format!(
                    "campaign {} has no engine campaign",
                    campaign_id
                )))
            }
            // Restarted under a new engine id while we waited for the lock.
            (Some(actual), Some(expected)) if actual != expected => {
                return Err(BridgeError::NotFound(format!(
                    "no campaign tracks engine campaign {}",
                    expected
                )))
            }
            (Some(actual), _) => actual.to_string(),
        };

        let status = self.ctx.fixer.fetch_status(&external_id).await?;

        // No suspension points past this line.
        let now = self.ctx.clock.now();
        let record = self
            .ctx
            .campaigns
            .merge_counters(campaign_id, status.counters, now)?;

        let snapshot = if record.state.is_stopped() {
            SnapshotWrite::Skipped
        } else if !self.ctx.throttle.should_write(campaign_id, now) {
            SNAPSHOTS_THROTTLED.inc();
            SnapshotWrite::Throttled
        } else {
            let written = self.ctx.write_snapshot(
                NewSnapshot {
                    campaign_id: campaign_id.to_string(),
                    observed_at: now,
                    metrics: status.metrics,
                    counters: status.counters,
                    upstream_status: status.status.clone(),
                },
                "poll",
            );
            if let SnapshotWrite::Failed(_) = written {
                // Let the next poll retry instead of waiting out the window.
                self.ctx.throttle.clear(campaign_id);
            }
            written
        };

        debug!(
            campaign_id = campaign_id,
            external_id = %external_id,
            upstream_status = %status.status,
            ordered_likes = status.counters.ordered_likes,
            snapshot_written = snapshot.is_written(),
            "Campaign status merged"
        );

        Ok(PollOutcome {
            record,
            status,
            snapshot,
        })
    }
}
