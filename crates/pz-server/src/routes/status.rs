use axum::Json;

/// GET /api/status: liveness banner.
pub async fn get_status() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "Protocol Zero API is Online",
        "god": "Loki",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
