use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use pz_core::oracle::{DashboardSnapshot, Stats};
use pz_core::progression::Profile;
use pz_core::store::{HourlyDistribution, InteractionRecord, VerdictCount};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

pub const DEFAULT_HISTORY_LIMIT: i64 = 5;
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;

/// Query-string errors get the same JSON body as every other 400.
fn query<T>(q: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    q.map(|Query(inner)| inner)
        .map_err(|e| AppError::bad_request(e.body_text()))
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub history: Option<i64>,
    pub leaderboard: Option<i64>,
}

/// GET /api/stats
pub async fn get_stats(State(app): State<AppState>) -> Result<Json<Stats>, AppError> {
    Ok(Json(app.oracle.stats().await?))
}

/// GET /api/history?limit=
pub async fn get_history(
    State(app): State<AppState>,
    q: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<InteractionRecord>>, AppError> {
    let q = query(q)?;
    let limit = q.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(app.oracle.history(limit).await?))
}

/// GET /api/verdicts: how often each penance has been handed out.
pub async fn get_verdicts(
    State(app): State<AppState>,
) -> Result<Json<Vec<VerdictCount>>, AppError> {
    Ok(Json(app.oracle.verdicts().await?))
}

/// GET /api/leaderboard?limit=
pub async fn get_leaderboard(
    State(app): State<AppState>,
    q: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<Profile>>, AppError> {
    let q = query(q)?;
    let limit = q.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    Ok(Json(app.oracle.leaderboard(limit).await?))
}

/// GET /api/hourly: 24 UTC buckets.
pub async fn get_hourly(
    State(app): State<AppState>,
) -> Result<Json<HourlyDistribution>, AppError> {
    Ok(Json(app.oracle.hourly().await?))
}

/// GET /api/dashboard: everything the dashboard page draws.
pub async fn get_dashboard(
    State(app): State<AppState>,
    q: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<DashboardSnapshot>, AppError> {
    let q = query(q)?;
    let snapshot = app
        .oracle
        .dashboard(
            q.history.unwrap_or(DEFAULT_HISTORY_LIMIT),
            q.leaderboard.unwrap_or(DEFAULT_LEADERBOARD_LIMIT),
        )
        .await?;
    Ok(Json(snapshot))
}

// ---------------------------------------------------------------------------
// Legacy shapes, kept for existing consumers
// ---------------------------------------------------------------------------

/// GET /stats
pub async fn legacy_stats(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let stats = app.oracle.stats().await?;
    Ok(Json(serde_json::json!({
        "total_punishments_served": stats.total,
    })))
}

/// GET /history
pub async fn legacy_history(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let recent: Vec<serde_json::Value> = app
        .oracle
        .history(DEFAULT_HISTORY_LIMIT)
        .await?
        .into_iter()
        .map(|r| {
            serde_json::json!({
                "user": r.user_name,
                "verdict": r.verdict,
                "time": r.created_at,
            })
        })
        .collect();
    Ok(Json(serde_json::json!({ "recent_punishments": recent })))
}
