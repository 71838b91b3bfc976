use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use std::convert::Infallible;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

/// SSE event name the dashboard listens for.
pub const UPDATE_EVENT: &str = "update";

fn update(msg: Result<i64, BroadcastStreamRecvError>) -> Result<Event, Infallible> {
    let event = Event::default().event(UPDATE_EVENT);
    Ok(match msg {
        Ok(id) => event.id(id.to_string()).data(id.to_string()),
        // A slow client missed some commits; one refresh catches it up.
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!(skipped, "event subscriber lagged");
            event.data("resync")
        }
    })
}

/// GET /api/events: one `update` event per recorded interaction, carrying its id.
pub async fn sse_events(State(app): State<AppState>) -> impl IntoResponse {
    let stream = BroadcastStream::new(app.oracle.subscribe()).map(update);
    Sse::new(stream).keep_alive(KeepAlive::default())
}

