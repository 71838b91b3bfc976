use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

use crate::error::AppError;

#[derive(Embed)]
#[folder = "assets/"]
struct DashboardAssets;

fn asset(path: &str, content_type: &str) -> Option<Response> {
    let content = <DashboardAssets as Embed>::get(path)?;
    Some(
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (header::CACHE_CONTROL, "no-cache".to_string()),
            ],
            content.data.into_owned(),
        )
            .into_response(),
    )
}

/// Fallback for everything the router does not match.
///
/// Unknown API paths get the JSON error body, missing files a plain 404, and
/// any other path the dashboard page.
pub async fn static_handler(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    if path == "api" || path.starts_with("api/") || path.starts_with("discord/") {
        return AppError::not_found(format!("no such endpoint: {}", uri.path())).into_response();
    }

    if !path.is_empty() {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        if let Some(response) = asset(path, mime.as_ref()) {
            return response;
        }
        if path.rsplit('/').next().is_some_and(|name| name.contains('.')) {
            return (StatusCode::NOT_FOUND, "not found").into_response();
        }
    }

    asset("index.html", "text/html; charset=utf-8")
        .unwrap_or_else(|| (StatusCode::NOT_FOUND, "dashboard not embedded").into_response())
}
