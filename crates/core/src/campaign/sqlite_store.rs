//! SQLite-backed campaign store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::db::{self, format_ts, from_db, parse_opt_ts, parse_ts, to_db};

use super::{
    Baseline, CampaignRecord, CampaignStore, EngagementMetrics, LifecycleState, NewCampaign,
    OrderCounters, StoreError,
};

const SELECT_COLUMNS: &str = "SELECT id, name, state, external_id, state_changed_at, views, likes, comments, baseline_likes, baseline_comments, ordered_likes, ordered_comments, desired_likes, desired_comments, last_checked_at, created_at, updated_at FROM campaigns";

/// SQLite-backed campaign store.
pub struct SqliteCampaignStore {
    conn: Mutex<Connection>,
}

impl SqliteCampaignStore {
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
            CREATE TABLE IF NOT EXISTS campaigns (
                id TEXT PRIMARY KEY,
                name TEXT,
                state TEXT NOT NULL DEFAULT 'not_started',
                external_id TEXT,
                state_changed_at TEXT,
                views INTEGER NOT NULL DEFAULT 0,
                likes INTEGER NOT NULL DEFAULT 0,
                comments INTEGER NOT NULL DEFAULT 0,
                baseline_likes INTEGER,
                baseline_comments INTEGER,
                ordered_likes INTEGER NOT NULL DEFAULT 0,
                ordered_comments INTEGER NOT NULL DEFAULT 0,
                desired_likes INTEGER NOT NULL DEFAULT 0,
                desired_comments INTEGER NOT NULL DEFAULT 0,
                last_checked_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK ((state = 'not_started') = (external_id IS NULL))
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_campaigns_external_id ON campaigns(external_id);
            CREATE INDEX IF NOT EXISTS idx_campaigns_updated_at ON campaigns(updated_at);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("campaign store lock poisoned".to_string()))
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<CampaignRecord> {
        let state_name: String = row.get(2)?;
        let external_id: Option<String> = row.get(3)?;
        let state_changed_at = parse_opt_ts(4, row.get(4)?)?;

        let state = match (state_name.as_str(), external_id, state_changed_at) {
            ("not_started", None, _) => LifecycleState::NotStarted,
            ("running", Some(external_id), Some(started_at)) => LifecycleState::Running {
                external_id,
                started_at,
            },
            ("stopped", Some(external_id), Some(stopped_at)) => LifecycleState::Stopped {
                external_id,
                stopped_at,
            },
            (other, _, _) => {
                return Err(rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    format!("inconsistent lifecycle state '{}'", other).into(),
                ))
            }
        };

        let baseline = match (row.get::<_, Option<i64>>(8)?, row.get::<_, Option<i64>>(9)?) {
            (Some(likes), Some(comments)) => Some(Baseline {
                likes: from_db(likes),
                comments: from_db(comments),
            }),
            _ => None,
        };

        let created_at: String = row.get(15)?;
        let updated_at: String = row.get(16)?;

        Ok(CampaignRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            state,
            metrics: EngagementMetrics {
                views: from_db(row.get(5)?),
                likes: from_db(row.get(6)?),
                comments: from_db(row.get(7)?),
            },
            baseline,
            counters: OrderCounters {
                ordered_likes: from_db(row.get(10)?),
                ordered_comments: from_db(row.get(11)?),
                desired_likes: from_db(row.get(12)?),
                desired_comments: from_db(row.get(13)?),
            },
            last_checked_at: parse_opt_ts(14, row.get(14)?)?,
            created_at: parse_ts(15, &created_at)?,
            updated_at: parse_ts(16, &updated_at)?,
        })
    }

    fn select(conn: &Connection, id: &str) -> Result<Option<CampaignRecord>, StoreError> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
        Ok(conn
            .query_row(&sql, params![id], Self::row_to_record)
            .optional()?)
    }

    fn select_existing(conn: &Connection, id: &str) -> Result<CampaignRecord, StoreError> {
        Self::select(conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation)
}

impl CampaignStore for SqliteCampaignStore {
    fn create(&self, campaign: NewCampaign) -> Result<CampaignRecord, StoreError> {
        let conn = self.conn()?;
        let now = format_ts(Utc::now());

        conn.execute(
            "INSERT INTO campaigns (id, name, state, views, likes, comments, created_at, updated_at) VALUES (?, ?, 'not_started', ?, ?, ?, ?, ?)",
            params![
                campaign.id,
                campaign.name,
                to_db(campaign.metrics.views),
                to_db(campaign.metrics.likes),
                to_db(campaign.metrics.comments),
                now,
                now,
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::Conflict(format!("campaign {} already exists", campaign.id))
            } else {
                e.into()
            }
        })?;

        Self::select_existing(&conn, &campaign.id)
    }

    fn get(&self, id: &str) -> Result<Option<CampaignRecord>, StoreError> {
        let conn = self.conn()?;
        Self::select(&conn, id)
    }

    fn get_or_create(&self, id: &str) -> Result<CampaignRecord, StoreError> {
        let conn = self.conn()?;
        let now = format_ts(Utc::now());
        conn.execute(
            "INSERT OR IGNORE INTO campaigns (id, state, created_at, updated_at) VALUES (?, 'not_started', ?, ?)",
            params![id, now, now],
        )?;
        Self::select_existing(&conn, id)
    }

    fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<CampaignRecord>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE external_id = ?", SELECT_COLUMNS);
        Ok(conn
            .query_row(&sql, params![external_id], Self::row_to_record)
            .optional()?)
    }

    fn list(&self, limit: i64, offset: i64) -> Result<Vec<CampaignRecord>, StoreError> {
        let conn = self.conn()?;
        let sql = format!(
            "{} ORDER BY updated_at DESC, id ASC LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit, offset], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn update_metrics(
        &self,
        id: &str,
        metrics: EngagementMetrics,
    ) -> Result<CampaignRecord, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE campaigns SET views = ?, likes = ?, comments = ?, updated_at = ? WHERE id = ?",
            params![
                to_db(metrics.views),
                to_db(metrics.likes),
                to_db(metrics.comments),
                format_ts(Utc::now()),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Self::select_existing(&conn, id)
    }

    fn mark_running(
        &self,
        id: &str,
        external_id: &str,
        baseline: Baseline,
        at: DateTime<Utc>,
    ) -> Result<CampaignRecord, StoreError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                r#"UPDATE campaigns SET
                    state = 'running', external_id = ?, state_changed_at = ?,
                    baseline_likes = ?, baseline_comments = ?,
                    ordered_likes = 0, ordered_comments = 0, desired_likes = 0, desired_comments = 0,
                    last_checked_at = NULL, updated_at = ?
                WHERE id = ? AND state != 'running'"#,
                params![
                    external_id,
                    format_ts(at),
                    to_db(baseline.likes),
                    to_db(baseline.comments),
                    format_ts(at),
                    id,
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Conflict(format!(
                        "external campaign {} is already tracked",
                        external_id
                    ))
                } else {
                    e.into()
                }
            })?;

        if changed == 0 {
            let existing = Self::select_existing(&conn, id)?;
            return Err(StoreError::Conflict(format!(
                "campaign {} is {}",
                id,
                existing.state.name()
            )));
        }
        Self::select_existing(&conn, id)
    }

    fn merge_counters(
        &self,
        id: &str,
        counters: OrderCounters,
        checked_at: DateTime<Utc>,
    ) -> Result<CampaignRecord, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"UPDATE campaigns SET
                ordered_likes = ?, ordered_comments = ?, desired_likes = ?, desired_comments = ?,
                last_checked_at = ?, updated_at = ?
            WHERE id = ?"#,
            params![
                to_db(counters.ordered_likes),
                to_db(counters.ordered_comments),
                to_db(counters.desired_likes),
                to_db(counters.desired_comments),
                format_ts(checked_at),
                format_ts(checked_at),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Self::select_existing(&conn, id)
    }

    fn mark_stopped(&self, id: &str, at: DateTime<Utc>) -> Result<CampaignRecord, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE campaigns SET state = 'stopped', state_changed_at = ?, updated_at = ? WHERE id = ? AND external_id IS NOT NULL",
            params![format_ts(at), format_ts(at), id],
        )?;
        if changed == 0 {
            Self::select_existing(&conn, id)?;
            return Err(StoreError::Conflict(format!(
                "campaign {} was never started",
                id
            )));
        }
        Self::select_existing(&conn, id)
    }
}
