//! Local mirror of campaign lifecycle state and last-known counters.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteCampaignStore;
pub use store::{CampaignStore, NewCampaign, StoreError};
pub use types::{Baseline, CampaignRecord, EngagementMetrics, LifecycleState, OrderCounters};
