use axum::extract::{Path, State};
use axum::Json;
use pz_core::progression::Profile;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/users/{id}: one profile.
pub async fn get_user(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(app.oracle.profile(&id).await?))
}
