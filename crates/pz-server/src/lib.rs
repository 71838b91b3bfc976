pub mod discord;
pub mod embed;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Status
        .route("/api/status", get(routes::status::get_status))
        // Cravings
        .route("/api/cravings", post(routes::cravings::report_craving))
        // Stats
        .route("/api/stats", get(routes::stats::get_stats))
        .route("/api/history", get(routes::stats::get_history))
        .route("/api/verdicts", get(routes::stats::get_verdicts))
        .route("/api/leaderboard", get(routes::stats::get_leaderboard))
        .route("/api/hourly", get(routes::stats::get_hourly))
        .route("/api/dashboard", get(routes::stats::get_dashboard))
        // Users
        .route("/api/users/{id}", get(routes::users::get_user))
        // Discord
        .route(
            "/discord/interactions",
            post(routes::discord::interactions),
        )
        // Legacy
        .route("/stats", get(routes::stats::legacy_stats))
        .route("/history", get(routes::stats::legacy_history))
        .fallback(embed::static_handler)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the API and dashboard on a pre-bound listener until the future is
/// dropped.
///
/// Accepting a bound `TcpListener` lets the caller read the actual port
/// first (useful with port 0).
pub async fn serve(
    state: AppState,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let port = listener.local_addr()?.port();
    let app = build_router(state);

    tracing::info!("Protocol Zero listening on http://localhost:{port}");

    if open_browser {
        let url = format!("http://localhost:{port}");
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, "could not open browser");
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
