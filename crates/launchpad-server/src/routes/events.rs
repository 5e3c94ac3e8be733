use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use launchpad_core::CacheEvent;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

fn event_name(event: &CacheEvent) -> &'static str {
    match event {
        CacheEvent::Invalidated { .. } => "invalidated",
        CacheEvent::Refreshed { .. } => "refreshed",
    }
}

/// GET /api/events: SSE stream of query cache events. Clients refetch the
/// keys named in `invalidated` events.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let rx = app.launchpad.cache().events();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        let event = msg.ok()?;
        let sse = Event::default().event(event_name(&event)).json_data(&event).ok()?;
        Some(Ok::<Event, Infallible>(sse))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
