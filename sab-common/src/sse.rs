//! Server-Sent Events (SSE) utilities

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::events::BridgeEvent;

/// Heartbeat interval for all SSE streams
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Turn a bridge event subscription into an SSE response
///
/// Sends an initial `ConnectionStatus` event, then one SSE event per
/// [`BridgeEvent`] (event name = variant name, data = JSON). Subscribers that
/// fall behind skip the missed events and keep streaming.
pub fn bridge_event_stream(
    service_name: &'static str,
    mut rx: broadcast::Receiver<BridgeEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    match serde_json::to_string(&event) {
                        Ok(data) => {
                            debug!("SSE: Sending {}", event.event_type());
                            yield Ok(Event::default().event(event.event_type()).data(data));
                        }
                        Err(e) => warn!("SSE: Failed to serialize event: {}", e),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("SSE: {} client lagged, skipped {} events", service_name, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("SSE: {} event bus closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}
