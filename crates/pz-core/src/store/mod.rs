//! Persistence for profiles and interactions.
//!
//! One [`Store`] trait, two implementations: [`SqliteStore`] for the local
//! embedded file and [`PostgresStore`] for a hosted database. Both run the
//! statements in [`dialect`], rendered for their placeholder syntax.

pub mod dialect;
pub mod postgres;
pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{PzError, Result};
use crate::progression::Profile;
use crate::types::{parse_timestamp, Outcome, Severity};

pub use dialect::Dialect;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Embedded database file used when nothing else is configured.
pub const DEFAULT_SQLITE_PATH: &str = "protocol_zero.db";

/// Path that selects an in-memory SQLite database.
pub const SQLITE_MEMORY: &str = ":memory:";

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Sqlite(PathBuf),
    Postgres(String),
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Sqlite(PathBuf::from(DEFAULT_SQLITE_PATH))
    }
}

impl Backend {
    /// Pick a backend from a `DATABASE_URL`-style string.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(Backend::Postgres(url.to_string()));
        }
        if let Some(rest) = url.strip_prefix("sqlite:") {
            let path = rest.strip_prefix("//").unwrap_or(rest);
            if path.is_empty() {
                return Err(PzError::InvalidConfig(
                    "sqlite URL has no database path".into(),
                ));
            }
            return Ok(Backend::Sqlite(PathBuf::from(path)));
        }
        if url.contains("://") {
            return Err(PzError::InvalidConfig(format!(
                "unsupported database URL scheme: {}",
                url.split("://").next().unwrap_or_default()
            )));
        }
        Ok(Backend::Sqlite(PathBuf::from(url)))
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            Backend::Sqlite(_) => Dialect::Sqlite,
            Backend::Postgres(_) => Dialect::Postgres,
        }
    }

    /// Human-readable description with credentials stripped.
    pub fn describe(&self) -> String {
        match self {
            Backend::Sqlite(path) => format!("sqlite ({})", path.display()),
            Backend::Postgres(url) => {
                let host = url
                    .split_once('@')
                    .map(|(_, rest)| rest)
                    .or_else(|| url.split_once("://").map(|(_, rest)| rest))
                    .unwrap_or(url);
                format!("postgres ({host})")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An interaction about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInteraction {
    pub user_id: String,
    pub user_name: String,
    pub outcome: Outcome,
    pub verdict: String,
    pub severity: Option<Severity>,
    pub xp_awarded: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub outcome: Outcome,
    pub verdict: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub xp_awarded: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCount {
    pub verdict: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub resisted: i64,
    pub relapsed: i64,
}

impl OutcomeCounts {
    pub(crate) fn add(&mut self, outcome: &str, n: i64) -> Result<()> {
        match outcome.parse::<Outcome>() {
            Ok(Outcome::Resisted) => self.resisted += n,
            Ok(Outcome::Relapsed) => self.relapsed += n,
            Err(_) => {
                return Err(PzError::Database(format!(
                    "unexpected outcome in interactions table: '{outcome}'"
                )))
            }
        }
        Ok(())
    }
}

/// Raw `users` row as both drivers read it.
pub(crate) struct ProfileRow {
    pub user_id: String,
    pub display_name: String,
    pub xp: i64,
    pub level: i64,
    pub streak: i64,
    pub best_streak: i64,
    pub failure_streak: i64,
    pub resisted_total: i64,
    pub relapsed_total: i64,
    pub last_event_at: Option<String>,
}

impl ProfileRow {
    pub fn into_profile(self) -> Result<Profile> {
        let last_event_at = self
            .last_event_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;
        Ok(Profile {
            user_id: self.user_id,
            display_name: self.display_name,
            xp: self.xp,
            level: self.level,
            streak: self.streak,
            best_streak: self.best_streak,
            failure_streak: self.failure_streak,
            resisted_total: self.resisted_total,
            relapsed_total: self.relapsed_total,
            last_event_at,
        })
    }
}

/// Raw `interactions` row.
pub(crate) struct InteractionRow {
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub outcome: String,
    pub verdict: String,
    pub severity: Option<String>,
    pub xp_awarded: i64,
    pub created_at: String,
}

impl InteractionRow {
    pub fn into_record(self) -> Result<InteractionRecord> {
        let outcome = self
            .outcome
            .parse::<Outcome>()
            .map_err(|_| PzError::Database(format!("unexpected outcome '{}'", self.outcome)))?;
        let severity = self
            .severity
            .as_deref()
            .map(str::parse::<Severity>)
            .transpose()?;
        Ok(InteractionRecord {
            id: self.id,
            user_id: self.user_id,
            user_name: self.user_name,
            outcome,
            verdict: self.verdict,
            severity,
            xp_awarded: self.xp_awarded,
            created_at: self.created_at,
        })
    }
}

/// Interaction counts per UTC hour of day.
pub type HourlyDistribution = [i64; 24];

pub(crate) fn fill_hourly(rows: impl IntoIterator<Item = (i64, i64)>) -> HourlyDistribution {
    let mut hours = [0i64; 24];
    for (hour, count) in rows {
        if let Ok(h) = usize::try_from(hour) {
            if h < 24 {
                hours[h] += count;
            }
        }
    }
    hours
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Store: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Create tables and indexes if missing.
    async fn migrate(&self) -> Result<()>;

    async fn load_profile(&self, user_id: &str) -> Result<Option<Profile>>;

    /// Upsert `profile` and insert `interaction` atomically. Returns the new
    /// interaction id.
    async fn commit(&self, profile: &Profile, interaction: &NewInteraction) -> Result<i64>;

    async fn total_count(&self) -> Result<i64>;

    async fn outcome_counts(&self) -> Result<OutcomeCounts>;

    /// Newest first.
    async fn recent_history(&self, limit: i64) -> Result<Vec<InteractionRecord>>;

    /// Penance verdicts by frequency, most common first.
    async fn verdict_counts(&self) -> Result<Vec<VerdictCount>>;

    async fn leaderboard(&self, limit: i64) -> Result<Vec<Profile>>;

    async fn hourly_distribution(&self) -> Result<HourlyDistribution>;
}

/// Connect to `backend` and bring its schema up to date.
pub async fn open(backend: &Backend) -> Result<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match backend {
        Backend::Sqlite(path) => Arc::new(SqliteStore::open(path)?),
        Backend::Postgres(url) => Arc::new(PostgresStore::connect(url).await?),
    };
    store.migrate().await?;
    tracing::info!(backend = %backend.describe(), "store ready");
    Ok(store)
}
