use crate::error::StoreError;

use super::{NewSnapshot, Snapshot};

/// Append-only snapshot storage. Rows are never updated or deleted.
pub trait SnapshotStore: Send + Sync {
    /// Persist an observation.
    ///
    /// `observed_at` values are strictly increasing per campaign: an observation
    /// not later than the newest stored one is stamped one microsecond after it.
    fn append(&self, snapshot: NewSnapshot) -> Result<Snapshot, StoreError>;

    /// Oldest-first history of a campaign, capped at `limit` most recent rows.
    fn list(&self, campaign_id: &str, limit: i64) -> Result<Vec<Snapshot>, StoreError>;

    /// Most recent observation of a campaign.
    fn latest(&self, campaign_id: &str) -> Result<Option<Snapshot>, StoreError>;

    /// Number of observations stored for a campaign.
    fn count(&self, campaign_id: &str) -> Result<i64, StoreError>;
}
