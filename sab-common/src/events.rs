//! Event types for the bridge event stream
//!
//! Events are broadcast via [`EventBus`] and serialized for SSE transmission.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::measurement::{MeasurementKind, MeasurementSource};

/// Bridge event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeEvent {
    /// Connect completed (capture software may or may not be present)
    Connected {
        /// Whether an installation was found
        installation_found: bool,
        /// Whether the capture process is running
        process_running: bool,
        /// When the connect attempt finished
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A measurement was acquired and appended to history
    MeasurementAcquired {
        /// Measurement id
        measurement_id: Uuid,
        /// Kind of measurement
        kind: MeasurementKind,
        /// File or simulated
        source: MeasurementSource,
        /// Source file name, for file-backed measurements
        filename: Option<String>,
        /// Acquisition time
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Runtime bridge configuration replaced
    ConfigUpdated {
        /// When the new configuration took effect
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An alignment report was computed
    AlignmentCompleted {
        /// Number of top-level recommendations in the report
        recommendation_count: usize,
        /// When the report was produced
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl BridgeEvent {
    /// Get event type as string for SSE event names
    pub fn event_type(&self) -> &str {
        match self {
            BridgeEvent::Connected { .. } => "Connected",
            BridgeEvent::MeasurementAcquired { .. } => "MeasurementAcquired",
            BridgeEvent::ConfigUpdated { .. } => "ConfigUpdated",
            BridgeEvent::AlignmentCompleted { .. } => "AlignmentCompleted",
        }
    }
}

/// Broadcast channel for [`BridgeEvent`]s
pub struct EventBus {
    tx: broadcast::Sender<BridgeEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: BridgeEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
