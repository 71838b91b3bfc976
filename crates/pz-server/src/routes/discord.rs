use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::discord::{self, Interaction, InteractionResponse, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::error::AppError;
use crate::state::AppState;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// POST /discord/interactions: Discord's signed webhook for slash commands.
pub async fn interactions(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InteractionResponse>, AppError> {
    let Some(verifier) = app.discord.as_ref() else {
        return Err(AppError::not_found("Discord interactions are not configured"));
    };

    let (Some(signature), Some(timestamp)) = (
        header(&headers, SIGNATURE_HEADER),
        header(&headers, TIMESTAMP_HEADER),
    ) else {
        tracing::warn!("Discord interaction without signature headers");
        return Err(AppError::unauthorized("missing request signature"));
    };
    if let Err(e) = verifier.verify(signature, timestamp, &body) {
        tracing::warn!(error = %e, "rejected Discord interaction");
        return Err(AppError::unauthorized("invalid request signature"));
    }

    let interaction: Interaction = serde_json::from_slice(&body)
        .map_err(|e| AppError::bad_request(format!("malformed interaction: {e}")))?;
    Ok(Json(discord::respond(&app.oracle, interaction).await))
}
