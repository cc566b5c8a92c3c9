//! Campaign start/stop against the ordering engine.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::campaign::{Baseline, CampaignRecord, EngagementMetrics, LifecycleState, OrderCounters};
use crate::config::OrderDefaults;
use crate::fixer::{CreateCampaignParams, StopAck};
use crate::metrics::LIFECYCLE_TRANSITIONS;
use crate::snapshot::{NewSnapshot, UpstreamStatus};

use super::{BridgeContext, BridgeError, SnapshotWrite};

/// Ordering parameters accepted by `start`.
///
/// `target_id` and `category` are required; everything else falls back to
/// the configured [`OrderDefaults`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartParams {
    pub target_url: Option<String>,
    pub target_id: Option<String>,
    pub category: Option<String>,
    pub comments_source: Option<String>,
    pub wait_time: Option<u32>,
    pub minimum_engagement: Option<u32>,
    pub comment_server_id: Option<u32>,
    pub like_server_id: Option<u32>,
    pub tier: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl StartParams {
    pub fn new(target_id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            target_id: Some(target_id.into()),
            category: Some(category.into()),
            ..Default::default()
        }
    }

    /// Validate and fill omitted options from `defaults`.
    pub fn resolve(&self, defaults: &OrderDefaults) -> Result<CreateCampaignParams, BridgeError> {
        let target_id = non_blank(&self.target_id)
            .ok_or_else(|| BridgeError::Validation("targetId is required".to_string()))?;
        let category = non_blank(&self.category)
            .ok_or_else(|| BridgeError::Validation("category is required".to_string()))?;

        let target_url = non_blank(&self.target_url);
        if let Some(url) = &target_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(BridgeError::Validation(format!(
                    "targetUrl must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }

        if self.wait_time == Some(0) {
            return Err(BridgeError::Validation(
                "waitTime must be greater than 0".to_string(),
            ));
        }

        Ok(CreateCampaignParams {
            target_url,
            target_id,
            category,
            comments_source: non_blank(&self.comments_source)
                .unwrap_or_else(|| defaults.comments_source.clone()),
            wait_time: self.wait_time.unwrap_or(defaults.wait_time),
            minimum_engagement: self.minimum_engagement.unwrap_or(defaults.minimum_engagement),
            comment_server_id: self.comment_server_id.unwrap_or(defaults.comment_server_id),
            like_server_id: self.like_server_id.unwrap_or(defaults.like_server_id),
            tier: non_blank(&self.tier).unwrap_or_else(|| defaults.tier.clone()),
        })
    }
}

/// Result of a successful `start`.
#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub record: CampaignRecord,
    pub external_id: String,
    /// The baseline snapshot.
    pub snapshot: SnapshotWrite,
}

/// Result of a `stop` whose upstream call succeeded.
#[derive(Debug, Clone)]
pub struct StopOutcome {
    pub record: CampaignRecord,
    /// Counters carried by the final snapshot.
    pub final_counters: OrderCounters,
    /// The final snapshot.
    pub snapshot: SnapshotWrite,
    pub upstream: StopAck,
}

/// Starts and stops engine campaigns.
#[derive(Clone)]
pub struct LifecycleController {
    ctx: Arc<BridgeContext>,
}

impl LifecycleController {
    pub fn new(ctx: Arc<BridgeContext>) -> Self {
        Self { ctx }
    }

    /// Start a campaign on the engine and enter `Running`.
    ///
    /// All-or-nothing: on any error the local record is left as it was.
    pub async fn start(
        &self,
        campaign_id: &str,
        params: StartParams,
    ) -> Result<StartOutcome, BridgeError> {
        let campaign_id = campaign_id.trim();
        if campaign_id.is_empty() {
            return Err(BridgeError::Validation("campaignId is required".to_string()));
        }
        let request = params.resolve(&self.ctx.defaults)?;

        let _guard = self.ctx.locks.lock(campaign_id).await;

        let existing = self.ctx.campaigns.get(campaign_id)?;
        if let Some(record) = &existing {
            if let LifecycleState::Running { external_id, .. } = &record.state {
                return Err(BridgeError::AlreadyRunning {
                    campaign_id: campaign_id.to_string(),
                    external_id: external_id.clone(),
                });
            }
        }
        // Baseline comes from what we know locally, never from the engine.
        let metrics = existing.map(|r| r.metrics).unwrap_or_default();
        let baseline = Baseline::from_metrics(&metrics);

        let external_id = self.ctx.fixer.create_campaign(&request).await?;

        let now = self.ctx.clock.now();
        let record = match self
            .ctx
            .campaigns
            .get_or_create(campaign_id)
            .and_then(|_| {
                self.ctx
                    .campaigns
                    .mark_running(campaign_id, &external_id, baseline, now)
            }) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    campaign_id = campaign_id,
                    external_id = %external_id,
                    error = %e,
                    "Failed to record running campaign, stopping engine campaign"
                );
                if let Err(stop_err) = self.ctx.fixer.stop_campaign(&external_id).await {
                    warn!(
                        external_id = %external_id,
                        error = %stop_err,
                        "Compensating engine stop failed"
                    );
                }
                return Err(e.into());
            }
        };

        self.ctx.throttle.clear(campaign_id);
        let snapshot = self.ctx.write_snapshot(
            NewSnapshot {
                campaign_id: campaign_id.to_string(),
                observed_at: now,
                metrics,
                counters: OrderCounters::default(),
                upstream_status: UpstreamStatus::Started,
            },
            "baseline",
        );

        LIFECYCLE_TRANSITIONS.with_label_values(&["running"]).inc();
        info!(
            campaign_id = campaign_id,
            external_id = %external_id,
            baseline_likes = baseline.likes,
            baseline_comments = baseline.comments,
            "Campaign started"
        );

        Ok(StartOutcome {
            record,
            external_id,
            snapshot,
        })
    }

    /// Stop a campaign by local id.
    ///
    /// The local record ends `Stopped` even when the engine cannot be told;
    /// that case is still reported as `UpstreamUnavailable`.
    pub async fn stop(&self, campaign_id: &str) -> Result<StopOutcome, BridgeError> {
        self.stop_guarded(campaign_id, None).await
    }

    /// Stop the campaign mirrored by an engine campaign id.
    pub async fn stop_external(&self, external_id: &str) -> Result<StopOutcome, BridgeError> {
        let record = self
            .ctx
            .campaigns
            .find_by_external_id(external_id)?
            .ok_or_else(|| {
                BridgeError::NotFound(format!("no campaign tracks engine campaign {}", external_id))
            })?;
        self.stop_guarded(&record.id, Some(external_id)).await
    }

    async fn stop_guarded(
        &self,
        campaign_id: &str,
        expected_external_id: Option<&str>,
    ) -> Result<StopOutcome, BridgeError> {
        let guard = self.ctx.locks.lock(campaign_id).await;
        let pending = self.prepare_stop(campaign_id, expected_external_id).await?;

        // Once the final values are known the stop runs to completion on its
        // own task, holding the campaign lock, even if the caller goes away.
        let ctx = Arc::clone(&self.ctx);
        let task = tokio::spawn(async move {
            let _guard = guard;
            finish_stop(&ctx, pending).await
        });

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(BridgeError::Interrupted(format!(
                "stop of campaign {} did not complete: {}",
                campaign_id, e
            ))),
        }
    }

    /// Resolve the engine campaign and the values for the final snapshot.
    ///
    /// The only suspension point is the status fetch, so cancelling here
    /// leaves the record untouched.
    async fn prepare_stop(
        &self,
        campaign_id: &str,
        expected_external_id: Option<&str>,
    ) -> Result<PendingStop, BridgeError> {
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
            (Some(actual), Some(expected)) if actual != expected => {
                return Err(BridgeError::NotFound(format!(
                    "no campaign tracks engine campaign {}",
                    expected
                )))
            }
            (Some(actual), _) => actual.to_string(),
        };

        // Best effort: fall back to the last known local values.
        let (metrics, counters) = match self.ctx.fixer.fetch_status(&external_id).await {
            Ok(status) => {
                if let Err(e) = self.ctx.campaigns.merge_counters(
                    campaign_id,
                    status.counters,
                    self.ctx.clock.now(),
                ) {
                    warn!(campaign_id = campaign_id, error = %e, "Failed to merge final counters");
                }
                (status.metrics, status.counters)
            }
            Err(e) => {
                warn!(
                    campaign_id = campaign_id,
                    external_id = %external_id,
                    error = %e,
                    "Final status fetch failed, using local counters"
                );
                (record.metrics, record.counters)
            }
        };

        Ok(PendingStop {
            campaign_id: campaign_id.to_string(),
            external_id,
            metrics,
            counters,
        })
    }
}

/// A stop whose final values are known but nothing is committed yet.
struct PendingStop {
    campaign_id: String,
    external_id: String,
    metrics: EngagementMetrics,
    counters: OrderCounters,
}

/// Final snapshot, engine stop, local transition, throttle reset.
async fn finish_stop(
    ctx: &BridgeContext,
    pending: PendingStop,
) -> Result<StopOutcome, BridgeError> {
    let PendingStop {
        campaign_id,
        external_id,
        metrics,
        counters,
    } = pending;

    let snapshot = ctx.write_snapshot(
        NewSnapshot {
            campaign_id: campaign_id.clone(),
            observed_at: ctx.clock.now(),
            metrics,
            counters,
            upstream_status: UpstreamStatus::Stopped,
        },
        "final",
    );

    let upstream = ctx.fixer.stop_campaign(&external_id).await;
    if let Err(e) = &upstream {
        warn!(
            campaign_id = %campaign_id,
            external_id = %external_id,
            error = %e,
            "Engine stop failed, marking campaign stopped locally"
        );
    }

    let record = ctx.campaigns.mark_stopped(&campaign_id, ctx.clock.now())?;
    ctx.throttle.clear(&campaign_id);

    LIFECYCLE_TRANSITIONS.with_label_values(&["stopped"]).inc();
    info!(
        campaign_id = %campaign_id,
        external_id = %external_id,
        ordered_likes = counters.ordered_likes,
        ordered_comments = counters.ordered_comments,
        upstream_ok = upstream.is_ok(),
        "Campaign stopped"
    );

    Ok(StopOutcome {
        record,
        final_counters: counters,
        snapshot,
        upstream: upstream?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_applies_defaults() {
        let defaults = OrderDefaults::default();
        let resolved = StartParams::new("v1", "pop").resolve(&defaults).unwrap();

        assert_eq!(resolved.target_id, "v1");
        assert_eq!(resolved.category, "pop");
        assert_eq!(resolved.wait_time, defaults.wait_time);
        assert_eq!(resolved.minimum_engagement, defaults.minimum_engagement);
        assert_eq!(resolved.tier, defaults.tier);
        assert_eq!(resolved.comments_source, defaults.comments_source);
        assert_eq!(resolved.target_url, None);
    }

    #[test]
    fn test_resolve_keeps_overrides() {
        let params = StartParams {
            tier: Some("premium".to_string()),
            like_server_id: Some(7),
            target_url: Some("https://video.example/v1".to_string()),
            ..StartParams::new("v1", "pop")
        };
        let resolved = params.resolve(&OrderDefaults::default()).unwrap();
        assert_eq!(resolved.tier, "premium");
        assert_eq!(resolved.like_server_id, 7);
        assert_eq!(resolved.target_url.as_deref(), Some("https://video.example/v1"));
    }

    #[test]
    fn test_resolve_rejects_missing_fields() {
        let defaults = OrderDefaults::default();

        let missing_category = StartParams {
            category: Some("  ".to_string()),
            ..StartParams::new("v1", "pop")
        };
        assert!(matches!(
            missing_category.resolve(&defaults),
            Err(BridgeError::Validation(_))
        ));

        assert!(matches!(
            StartParams::default().resolve(&defaults),
            Err(BridgeError::Validation(_))
        ));

        let bad_url = StartParams {
            target_url: Some("ftp://example".to_string()),
            ..StartParams::new("v1", "pop")
        };
        assert!(matches!(bad_url.resolve(&defaults), Err(BridgeError::Validation(_))));
    }
}
