//! Hosted PostgreSQL backend.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use super::dialect::{
    Dialect, HOURLY, INSERT_INTERACTION, LEADERBOARD, OUTCOME_COUNTS, RECENT_HISTORY,
    SELECT_PROFILE, TOTAL_COUNT, UPSERT_PROFILE, VERDICT_COUNTS,
};
use super::{
    fill_hourly, HourlyDistribution, InteractionRecord, InteractionRow, NewInteraction,
    OutcomeCounts, ProfileRow, Store, VerdictCount,
};
use crate::error::Result;
use crate::progression::Profile;
use crate::types::format_timestamp;

const DIALECT: Dialect = Dialect::Postgres;
const MAX_CONNECTIONS: u32 = 5;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }
}

fn profile_row(row: &PgRow) -> std::result::Result<ProfileRow, sqlx::Error> {
    Ok(ProfileRow {
        user_id: row.try_get(0)?,
        display_name: row.try_get(1)?,
        xp: row.try_get(2)?,
        level: row.try_get(3)?,
        streak: row.try_get(4)?,
        best_streak: row.try_get(5)?,
        failure_streak: row.try_get(6)?,
        resisted_total: row.try_get(7)?,
        relapsed_total: row.try_get(8)?,
        last_event_at: row.try_get(9)?,
    })
}

fn interaction_row(row: &PgRow) -> std::result::Result<InteractionRow, sqlx::Error> {
    Ok(InteractionRow {
        id: row.try_get(0)?,
        user_id: row.try_get(1)?,
        user_name: row.try_get(2)?,
        outcome: row.try_get(3)?,
        verdict: row.try_get(4)?,
        severity: row.try_get(5)?,
        xp_awarded: row.try_get(6)?,
        created_at: row.try_get(7)?,
    })
}

#[async_trait]
impl Store for PostgresStore {
    fn dialect(&self) -> Dialect {
        DIALECT
    }

    async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for stmt in DIALECT.schema() {
            sqlx::query(&stmt).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn load_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let row = sqlx::query(&DIALECT.render(SELECT_PROFILE))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(profile_row(&row)?.into_profile()?)),
            None => Ok(None),
        }
    }

    async fn commit(&self, profile: &Profile, interaction: &NewInteraction) -> Result<i64> {
        let upsert = DIALECT.render(UPSERT_PROFILE);
        let insert = DIALECT.render(INSERT_INTERACTION);

        let mut tx = self.pool.begin().await?;
        sqlx::query(&upsert)
            .bind(&profile.user_id)
            .bind(&profile.display_name)
            .bind(profile.xp)
            .bind(profile.level)
            .bind(profile.streak)
            .bind(profile.best_streak)
            .bind(profile.failure_streak)
            .bind(profile.resisted_total)
            .bind(profile.relapsed_total)
            .bind(profile.last_event_at.map(format_timestamp))
            .execute(&mut *tx)
            .await?;
        let row = sqlx::query(&insert)
            .bind(&interaction.user_id)
            .bind(&interaction.user_name)
            .bind(interaction.outcome.as_str())
            .bind(&interaction.verdict)
            .bind(interaction.severity.map(|s| s.as_str()))
            .bind(interaction.xp_awarded)
            .bind(&interaction.created_at)
            .fetch_one(&mut *tx)
            .await?;
        let id: i64 = row.try_get(0)?;
        tx.commit().await?;
        Ok(id)
    }

    async fn total_count(&self) -> Result<i64> {
        let row = sqlx::query(TOTAL_COUNT).fetch_one(&self.pool).await?;
        Ok(row.try_get(0)?)
    }

    async fn outcome_counts(&self) -> Result<OutcomeCounts> {
        let rows = sqlx::query(OUTCOME_COUNTS).fetch_all(&self.pool).await?;
        let mut counts = OutcomeCounts::default();
        for row in rows {
            let outcome: String = row.try_get(0)?;
            counts.add(&outcome, row.try_get(1)?)?;
        }
        Ok(counts)
    }

    async fn recent_history(&self, limit: i64) -> Result<Vec<InteractionRecord>> {
        let rows = sqlx::query(&DIALECT.render(RECENT_HISTORY))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| interaction_row(row)?.into_record())
            .collect()
    }

    async fn verdict_counts(&self) -> Result<Vec<VerdictCount>> {
        let rows = sqlx::query(VERDICT_COUNTS).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(VerdictCount {
                    verdict: row.try_get(0)?,
                    count: row.try_get(1)?,
                })
            })
            .collect()
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<Profile>> {
        let rows = sqlx::query(&DIALECT.render(LEADERBOARD))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| profile_row(row)?.into_profile())
            .collect()
    }

    async fn hourly_distribution(&self) -> Result<HourlyDistribution> {
        let rows = sqlx::query(HOURLY).fetch_all(&self.pool).await?;
        let pairs = rows
            .iter()
            .map(|row| Ok((row.try_get::<i64, _>(0)?, row.try_get::<i64, _>(1)?)))
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;
        Ok(fill_hourly(pairs))
    }
}
