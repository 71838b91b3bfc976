//! Embedded SQLite backend.
//!
//! rusqlite is synchronous, so every call hops onto the blocking pool and
//! takes the single connection under a mutex.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::dialect::{
    Dialect, HOURLY, INSERT_INTERACTION, LEADERBOARD, OUTCOME_COUNTS, RECENT_HISTORY,
    SELECT_PROFILE, TOTAL_COUNT, UPSERT_PROFILE, VERDICT_COUNTS,
};
use super::{
    fill_hourly, HourlyDistribution, InteractionRecord, InteractionRow, NewInteraction,
    OutcomeCounts, ProfileRow, Store, VerdictCount, SQLITE_MEMORY,
};
use crate::error::{PzError, Result};
use crate::progression::Profile;
use crate::types::format_timestamp;

const DIALECT: Dialect = Dialect::Sqlite;

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`. The path
    /// `:memory:` opens a private in-memory database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = if path.as_os_str() == SQLITE_MEMORY {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Connection::open(path)?
        };
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(Path::new(SQLITE_MEMORY))
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| PzError::Database("sqlite connection mutex poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| PzError::Database(format!("sqlite task failed: {e}")))?
    }
}

fn profile_row(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        user_id: row.get(0)?,
        display_name: row.get(1)?,
        xp: row.get(2)?,
        level: row.get(3)?,
        streak: row.get(4)?,
        best_streak: row.get(5)?,
        failure_streak: row.get(6)?,
        resisted_total: row.get(7)?,
        relapsed_total: row.get(8)?,
        last_event_at: row.get(9)?,
    })
}

fn interaction_row(row: &Row<'_>) -> rusqlite::Result<InteractionRow> {
    Ok(InteractionRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_name: row.get(2)?,
        outcome: row.get(3)?,
        verdict: row.get(4)?,
        severity: row.get(5)?,
        xp_awarded: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    fn dialect(&self) -> Dialect {
        DIALECT
    }

    async fn migrate(&self) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            for stmt in DIALECT.schema() {
                tx.execute(&stmt, [])?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn load_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(&DIALECT.render(SELECT_PROFILE), params![user_id], profile_row)
                .optional()?;
            row.map(ProfileRow::into_profile).transpose()
        })
        .await
    }

    async fn commit(&self, profile: &Profile, interaction: &NewInteraction) -> Result<i64> {
        let profile = profile.clone();
        let interaction = interaction.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                &DIALECT.render(UPSERT_PROFILE),
                params![
                    profile.user_id,
                    profile.display_name,
                    profile.xp,
                    profile.level,
                    profile.streak,
                    profile.best_streak,
                    profile.failure_streak,
                    profile.resisted_total,
                    profile.relapsed_total,
                    profile.last_event_at.map(format_timestamp),
                ],
            )?;
            let id: i64 = tx.query_row(
                &DIALECT.render(INSERT_INTERACTION),
                params![
                    interaction.user_id,
                    interaction.user_name,
                    interaction.outcome.as_str(),
                    interaction.verdict,
                    interaction.severity.map(|s| s.as_str()),
                    interaction.xp_awarded,
                    interaction.created_at,
                ],
                |row| row.get(0),
            )?;
            tx.commit()?;
            Ok(id)
        })
        .await
    }

    async fn total_count(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(conn.query_row(TOTAL_COUNT, [], |row| row.get(0))?))
            .await
    }

    async fn outcome_counts(&self) -> Result<OutcomeCounts> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(OUTCOME_COUNTS)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            let mut counts = OutcomeCounts::default();
            for (outcome, n) in rows {
                counts.add(&outcome, n)?;
            }
            Ok(counts)
        })
        .await
    }

    async fn recent_history(&self, limit: i64) -> Result<Vec<InteractionRecord>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&DIALECT.render(RECENT_HISTORY))?;
            let rows = stmt
                .query_map(params![limit], interaction_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(InteractionRow::into_record).collect()
        })
        .await
    }

    async fn verdict_counts(&self) -> Result<Vec<VerdictCount>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(VERDICT_COUNTS)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(VerdictCount {
                        verdict: row.get(0)?,
                        count: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<Profile>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&DIALECT.render(LEADERBOARD))?;
            let rows = stmt
                .query_map(params![limit], profile_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(ProfileRow::into_profile).collect()
        })
        .await
    }

    async fn hourly_distribution(&self) -> Result<HourlyDistribution> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(HOURLY)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(fill_hourly(rows))
        })
        .await
    }
}
