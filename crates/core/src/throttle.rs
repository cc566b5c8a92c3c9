//! Per-campaign snapshot throttle.
//!
//! Callers may poll a campaign every few seconds; only one polled snapshot
//! per window is persisted. The map lives in memory only, so a restart lets
//! every campaign write immediately.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

/// Default throttle window.
pub const DEFAULT_SNAPSHOT_INTERVAL: Duration = Duration::from_secs(300);

/// Tracks when each campaign last had a snapshot written.
#[derive(Debug)]
pub struct SnapshotThrottle {
    interval: chrono::Duration,
    last_write: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Default for SnapshotThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_INTERVAL)
    }
}

impl SnapshotThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: chrono::Duration::from_std(interval).unwrap_or(chrono::Duration::MAX),
            last_write: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval.to_std().unwrap_or(Duration::MAX)
    }

    // A panic while holding the lock cannot leave the map half-updated.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.last_write
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Check-and-set: returns true and records `now` if the campaign has no
    /// recorded write or the window has elapsed. Otherwise leaves state alone.
    pub fn should_write(&self, campaign_id: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self.entries();
        match entries.get(campaign_id) {
            Some(last) if now.signed_duration_since(*last) < self.interval => {
                debug!(
                    campaign_id = campaign_id,
                    last_write = %last,
                    "Snapshot throttled"
                );
                false
            }
            _ => {
                entries.insert(campaign_id.to_string(), now);
                true
            }
        }
    }

    /// Forget a campaign so its next observation is written immediately.
    pub fn clear(&self, campaign_id: &str) -> bool {
        self.entries().remove(campaign_id).is_some()
    }

    pub fn last_write(&self, campaign_id: &str) -> Option<DateTime<Utc>> {
        self.entries().get(campaign_id).copied()
    }

    /// Number of campaigns with an open window.
    pub fn tracked(&self) -> usize {
        self.entries().len()
    }
}
