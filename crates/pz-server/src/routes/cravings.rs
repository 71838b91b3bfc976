use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use pz_core::oracle::Judgement;
use pz_core::types::{Outcome, UserRef};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CravingBody {
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    /// Parsed leniently so aliases like `resist` work.
    pub outcome: String,
}

#[derive(Debug, Serialize)]
pub struct CravingResponse {
    pub message: String,
    #[serde(flatten)]
    pub judgement: Judgement,
}

/// POST /api/cravings: report a craving and receive a verdict.
pub async fn report_craving(
    State(app): State<AppState>,
    body: Result<Json<CravingBody>, JsonRejection>,
) -> Result<Json<CravingResponse>, AppError> {
    let Json(body) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    let outcome: Outcome = body.outcome.parse()?;
    let user = UserRef::new(&body.user_id, body.user_name.as_deref())?;
    let judgement = app.oracle.judge(&user, outcome).await?;
    Ok(Json(CravingResponse {
        message: judgement.message(),
        judgement,
    }))
}
