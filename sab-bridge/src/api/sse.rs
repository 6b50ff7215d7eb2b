//! Server-Sent Events for bridge activity

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events
///
/// Streams `Connected`, `MeasurementAcquired`, `ConfigUpdated` and
/// `AlignmentCompleted` events as JSON, with a heartbeat keep-alive.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sab_common::sse::bridge_event_stream(crate::SERVICE_NAME, state.bridge.events().subscribe())
}
