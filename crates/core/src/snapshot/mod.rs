//! Append-only time series of observed campaign metrics.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteSnapshotStore;
pub use store::SnapshotStore;
pub use types::{NewSnapshot, Snapshot, UpstreamStatus};
