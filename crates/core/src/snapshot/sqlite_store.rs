//! SQLite-backed snapshot store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, SubsecRound};
use rusqlite::{params, Connection, OptionalExtension};

use crate::campaign::{EngagementMetrics, OrderCounters};
use crate::db::{self, format_ts, from_db, parse_ts, to_db};
use crate::error::StoreError;

use super::{NewSnapshot, Snapshot, SnapshotStore, UpstreamStatus};

const SELECT_COLUMNS: &str = "SELECT id, campaign_id, observed_at, views, likes, comments, ordered_likes, ordered_comments, desired_likes, desired_comments, upstream_status FROM snapshots";

/// SQLite-backed snapshot store.
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = db::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = db::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                campaign_id TEXT NOT NULL,
                observed_at TEXT NOT NULL,
                views INTEGER NOT NULL,
                likes INTEGER NOT NULL,
                comments INTEGER NOT NULL,
                ordered_likes INTEGER NOT NULL,
                ordered_comments INTEGER NOT NULL,
                desired_likes INTEGER NOT NULL,
                desired_comments INTEGER NOT NULL,
                upstream_status TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_snapshots_campaign_observed
                ON snapshots(campaign_id, observed_at);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("snapshot store lock poisoned".to_string()))
    }

    fn row_to_snapshot(row: &rusqlite::Row) -> rusqlite::Result<Snapshot> {
        let observed_at: String = row.get(2)?;
        let status: String = row.get(10)?;
        Ok(Snapshot {
            id: row.get(0)?,
            campaign_id: row.get(1)?,
            observed_at: parse_ts(2, &observed_at)?,
            metrics: EngagementMetrics {
                views: from_db(row.get(3)?),
                likes: from_db(row.get(4)?),
                comments: from_db(row.get(5)?),
            },
            counters: OrderCounters {
                ordered_likes: from_db(row.get(6)?),
                ordered_comments: from_db(row.get(7)?),
                desired_likes: from_db(row.get(8)?),
                desired_comments: from_db(row.get(9)?),
            },
            upstream_status: UpstreamStatus::from(status),
        })
    }

    fn select_latest(conn: &Connection, campaign_id: &str) -> Result<Option<Snapshot>, StoreError> {
        let sql = format!(
            "{} WHERE campaign_id = ? ORDER BY observed_at DESC LIMIT 1",
            SELECT_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![campaign_id], Self::row_to_snapshot)
            .optional()?)
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn append(&self, snapshot: NewSnapshot) -> Result<Snapshot, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        // Stored precision is microseconds; compare at that precision.
        let mut observed_at = snapshot.observed_at.trunc_subsecs(6);
        if let Some(latest) = Self::select_latest(&tx, &snapshot.campaign_id)? {
            if observed_at <= latest.observed_at {
                observed_at = latest.observed_at + Duration::microseconds(1);
            }
        }

        tx.execute(
            "INSERT INTO snapshots (campaign_id, observed_at, views, likes, comments, ordered_likes, ordered_comments, desired_likes, desired_comments, upstream_status) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                snapshot.campaign_id,
                format_ts(observed_at),
                to_db(snapshot.metrics.views),
                to_db(snapshot.metrics.likes),
                to_db(snapshot.metrics.comments),
                to_db(snapshot.counters.ordered_likes),
                to_db(snapshot.counters.ordered_comments),
                to_db(snapshot.counters.desired_likes),
                to_db(snapshot.counters.desired_comments),
                snapshot.upstream_status.as_str(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Snapshot {
            id,
            campaign_id: snapshot.campaign_id,
            observed_at,
            metrics: snapshot.metrics,
            counters: snapshot.counters,
            upstream_status: snapshot.upstream_status,
        })
    }

    fn list(&self, campaign_id: &str, limit: i64) -> Result<Vec<Snapshot>, StoreError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT * FROM ({} WHERE campaign_id = ? ORDER BY observed_at DESC LIMIT ?) ORDER BY observed_at ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![campaign_id, limit], Self::row_to_snapshot)?;

        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(row?);
        }
        Ok(snapshots)
    }

    fn latest(&self, campaign_id: &str) -> Result<Option<Snapshot>, StoreError> {
        let conn = self.conn()?;
        Self::select_latest(&conn, campaign_id)
    }

    fn count(&self, campaign_id: &str) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM snapshots WHERE campaign_id = ?",
            params![campaign_id],
            |row| row.get(0),
        )?)
    }
}
