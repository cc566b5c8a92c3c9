//! Per-campaign mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

fn entries(map: &LockMap) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hands out one async lock per local campaign id.
///
/// Entries live only while someone holds or waits on them, so ids that are
/// looked up once (unknown campaigns, campaigns never stopped) do not
/// accumulate.
#[derive(Debug, Default)]
pub struct CampaignLocks {
    locks: Arc<LockMap>,
}

/// Exclusive access to one campaign.
///
/// Dropping the guard releases the lock and removes the map entry when no
/// other task is waiting on it. This also happens when the holding future is
/// cancelled. The guard owns its handles and can be moved into a spawned task.
#[derive(Debug)]
pub struct CampaignGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
    campaign_id: String,
}

impl CampaignGuard {
    pub fn campaign_id(&self) -> &str {
        &self.campaign_id
    }
}

impl Drop for CampaignGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut entries = entries(&self.locks);
        // Handles are only cloned under the map lock, so a count of one
        // means no guard or waiter exists.
        if let Some(lock) = entries.get(&self.campaign_id) {
            if Arc::strong_count(lock) == 1 {
                entries.remove(&self.campaign_id);
            }
        }
    }
}

impl CampaignLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a campaign.
    pub async fn lock(&self, campaign_id: &str) -> CampaignGuard {
        let lock = Arc::clone(
            entries(&self.locks)
                .entry(campaign_id.to_string())
                .or_default(),
        );
        let guard = lock.lock_owned().await;
        CampaignGuard {
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
            campaign_id: campaign_id.to_string(),
        }
    }

    /// Number of campaigns with a lock entry.
    pub fn len(&self) -> usize {
        entries(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_campaign_is_exclusive() {
        let locks = Arc::new(CampaignLocks::new());
        let guard = locks.lock("c1").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("c1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_campaigns_do_not_block() {
        let locks = CampaignLocks::new();
        let _a = locks.lock("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("b")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_entry_removed_when_last_guard_drops() {
        let locks = CampaignLocks::new();
        let guard = locks.lock("c1").await;
        assert_eq!(guard.campaign_id(), "c1");
        assert_eq!(locks.len(), 1);

        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_entry_kept_while_waiter_queued() {
        let locks = Arc::new(CampaignLocks::new());
        let guard = locks.lock("c1").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("c1").await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_leaves_no_entry() {
        let locks = CampaignLocks::new();
        let guard = locks.lock("c1").await;

        let waited = tokio::time::timeout(Duration::from_millis(20), locks.lock("c1")).await;
        assert!(waited.is_err());

        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_guard_moves_into_spawned_task() {
        let locks = Arc::new(CampaignLocks::new());
        let guard = locks.lock("c1").await;

        tokio::spawn(async move {
            let _held = guard;
        })
        .await
        .unwrap();

        assert!(locks.is_empty());
    }
}
