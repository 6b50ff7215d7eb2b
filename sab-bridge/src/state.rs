//! Shared bridge state
//!
//! One [`BridgeState`] per process, shared by every request handler. The
//! runtime [`BridgeConfig`] is replaced whole on update and the history is
//! append-only, so each operation holds a lock only for a single read,
//! swap or push.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use sab_common::events::{BridgeEvent, EventBus};

use crate::acquisition;
use crate::analysis::AlignmentSnapshot;
use crate::config::{BridgeConfig, BridgeConfigUpdate};
use crate::discovery::{Discovery, FileScan, InstallationInfo, ProcessInfo};
use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::history::MeasurementHistory;
use crate::measurement::{Measurement, MeasurementKind, MeasurementSource, MeasurementSummary};

/// Events buffered per SSE subscriber
const EVENT_CAPACITY: usize = 64;

/// Current measurement as reported by [`BridgeState::get_status`]
#[derive(Debug, Clone, Serialize)]
pub struct CurrentMeasurement {
    pub id: Uuid,
    pub kind: MeasurementKind,
    pub source: MeasurementSource,
    pub timestamp: DateTime<Utc>,
}

impl From<&Measurement> for CurrentMeasurement {
    fn from(m: &Measurement) -> Self {
        Self {
            id: m.id(),
            kind: m.kind(),
            source: m.source(),
            timestamp: m.timestamp(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStatus {
    pub connected: bool,
    pub current_measurement: Option<CurrentMeasurement>,
    pub measurement_count: usize,
    pub config: BridgeConfig,
    pub data_path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation: Option<InstallationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<ProcessInfo>,
    pub data_path: String,
    pub data_path_accessible: bool,
}

/// Process-level bridge state
pub struct BridgeState {
    discovery: Discovery,
    config: RwLock<BridgeConfig>,
    history: RwLock<MeasurementHistory>,
    connected: AtomicBool,
    generator: Mutex<Generator>,
    read_timeout: Duration,
    events: EventBus,
}

impl BridgeState {
    pub fn new(
        discovery: Discovery,
        config: BridgeConfig,
        generator: Generator,
        history_capacity: usize,
        read_timeout: Duration,
    ) -> Self {
        Self {
            discovery,
            config: RwLock::new(config),
            history: RwLock::new(MeasurementHistory::new(history_capacity)),
            connected: AtomicBool::new(false),
            generator: Mutex::new(generator),
            read_timeout,
            events: EventBus::new(EVENT_CAPACITY),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    pub async fn config(&self) -> BridgeConfig {
        self.config.read().await.clone()
    }

    pub async fn get_status(&self) -> BridgeStatus {
        let config = self.config().await;
        let history = self.history.read().await;
        BridgeStatus {
            connected: self.connected.load(Ordering::Relaxed),
            current_measurement: history.latest().map(|m| CurrentMeasurement::from(m.as_ref())),
            measurement_count: history.len(),
            config,
            data_path: self.discovery.data_path().display().to_string(),
        }
    }

    /// Probe for the capture software and mark the bridge connected
    ///
    /// A missing installation is reported as `success: false`; it does not
    /// stop measurements, which fall back to synthesis.
    pub async fn connect(&self) -> ConnectResponse {
        info!("Checking for capture software installation");
        let installation = self.discovery.detect_installation().await;
        let running = self.discovery.detect_running_process().await;
        let data_path = self.discovery.data_path().display().to_string();
        let data_path_accessible = self.discovery.data_path_accessible().await;

        match &running {
            Some(process) => info!(
                "Capture software running (PID: {})",
                process.pid.map_or_else(|| "unknown".to_string(), |p| p.to_string())
            ),
            None => info!("Capture software is not running"),
        }
        if !data_path_accessible {
            warn!("Data directory not accessible: {}", data_path);
        }

        self.events.emit_lossy(BridgeEvent::Connected {
            installation_found: installation.is_some(),
            process_running: running.is_some(),
            timestamp: sab_common::time::now(),
        });

        match installation {
            Some(installation) => {
                self.connected.store(true, Ordering::Relaxed);
                info!("Connected to capture software");
                ConnectResponse {
                    success: true,
                    message: Some("Connected to capture software".to_string()),
                    error: None,
                    installation: Some(installation),
                    running,
                    data_path,
                    data_path_accessible,
                }
            }
            None => {
                warn!("Capture software installation not found");
                ConnectResponse {
                    success: false,
                    message: None,
                    error: Some("Capture software not found in standard locations".to_string()),
                    installation: None,
                    running,
                    data_path,
                    data_path_accessible,
                }
            }
        }
    }

    /// Acquire a measurement: first parsable file, else synthesis
    ///
    /// Always succeeds; the result is appended to history.
    pub async fn get_measurement(&self, kind: MeasurementKind) -> Result<Arc<Measurement>> {
        let scan = self.discovery.list_measurement_files().await;
        let from_file = if scan.files.is_empty() {
            None
        } else {
            info!("Found {} measurement files, attempting to read", scan.files.len());
            acquisition::read_first_candidate(&scan.files, kind, self.read_timeout).await
        };

        let measurement = match from_file {
            Some(measurement) => measurement,
            None => {
                info!("Using simulated {} measurement", kind);
                self.generate(kind).await?
            }
        };

        let measurement = Arc::new(measurement);
        self.history.write().await.push(measurement.clone());
        self.events.emit_lossy(BridgeEvent::MeasurementAcquired {
            measurement_id: measurement.id(),
            kind,
            source: measurement.source(),
            filename: measurement.filename().map(str::to_string),
            timestamp: measurement.timestamp(),
        });
        Ok(measurement)
    }

    /// Generated measurement; no file discovery, no history entry
    pub async fn synthesize(&self, kind: MeasurementKind) -> Result<Measurement> {
        self.generate(kind).await
    }

    async fn generate(&self, kind: MeasurementKind) -> Result<Measurement> {
        let config = self.config().await;
        let data = {
            let mut generator = self
                .generator
                .lock()
                .map_err(|_| Error::Internal("generator lock poisoned".to_string()))?;
            generator.generate(kind, &config)
        };
        Ok(Measurement::simulated(data)?)
    }

    /// Acquire all four kinds and analyze them
    pub async fn get_alignment_report(&self) -> Result<AlignmentSnapshot> {
        info!("Performing sound system alignment analysis");
        let spectrum = self.get_measurement(MeasurementKind::Spectrum).await?;
        let transfer = self.get_measurement(MeasurementKind::TransferFunction).await?;
        let phase = self.get_measurement(MeasurementKind::Phase).await?;
        let impulse = self.get_measurement(MeasurementKind::ImpulseResponse).await?;

        let snapshot = AlignmentSnapshot::from_measurements(&spectrum, &transfer, &phase, &impulse)?;
        self.events.emit_lossy(BridgeEvent::AlignmentCompleted {
            recommendation_count: snapshot.report.recommendations.len(),
            timestamp: snapshot.timestamp,
        });
        Ok(snapshot)
    }

    /// Oldest first
    pub async fn list_history(&self) -> Vec<Arc<Measurement>> {
        self.history.read().await.list()
    }

    pub async fn history_summaries(&self) -> Vec<MeasurementSummary> {
        self.history
            .read()
            .await
            .list()
            .iter()
            .map(|m| m.summary())
            .collect()
    }

    pub async fn get_history_entry(&self, id: Uuid) -> Result<Arc<Measurement>> {
        self.history
            .read()
            .await
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("measurement {}", id)))
    }

    pub async fn list_candidate_files(&self) -> FileScan {
        self.discovery.list_measurement_files().await
    }

    /// Merge `update` into the stored config and swap it in
    ///
    /// On error the stored config is unchanged.
    pub async fn update_config(&self, update: &BridgeConfigUpdate) -> Result<BridgeConfig> {
        let updated = {
            let mut config = self.config.write().await;
            let merged = config.merged(update)?;
            *config = merged.clone();
            merged
        };
        info!(
            "Configuration updated: {}-{} Hz, {} samples",
            updated.low_freq, updated.high_freq, updated.impulse_points
        );
        self.events.emit_lossy(BridgeEvent::ConfigUpdated {
            timestamp: sab_common::time::now(),
        });
        Ok(updated)
    }
}
