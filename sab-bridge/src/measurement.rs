//! Measurement data model
//!
//! A [`Measurement`] is immutable once built. Construction goes through
//! [`Measurement::simulated`] or [`Measurement::from_file`], both of which
//! reject empty payloads and out-of-order axes, so every measurement handed
//! to the analysis engine is non-empty and strictly increasing along its
//! frequency or time axis. Impulse responses additionally start at 0 s and
//! advance by a uniform step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use sab_common::measurement::{MeasurementKind, MeasurementSource};

/// Allowed deviation of an impulse sample step from the first step, as a
/// fraction of that step. Covers time columns rounded on export.
pub const IMPULSE_STEP_TOLERANCE: f64 = 0.1;

/// Measurement construction errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeasurementError {
    /// Payload had no points
    #[error("{0} measurement has no points")]
    Empty(MeasurementKind),

    /// Axis value not strictly increasing, not positive, or not finite
    #[error("{kind} measurement has an invalid axis value at point {index}")]
    InvalidAxis { kind: MeasurementKind, index: usize },

    /// First impulse sample is not at t = 0
    #[error("impulse response starts at {0} s instead of 0 s")]
    ImpulseOffset(f64),

    /// Impulse sample spacing changes along the window
    #[error("impulse response time step is not uniform at point {0}")]
    NonUniformStep(usize),
}

/// One spectrum bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPoint {
    /// Hz
    pub frequency: f64,
    /// dB
    pub level: f64,
    /// Degrees
    pub phase: f64,
    /// 0.0..=1.0
    pub coherence: f64,
}

/// One transfer-function bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferPoint {
    pub frequency: f64,
    /// dB
    pub magnitude: f64,
    pub phase: f64,
    pub coherence: f64,
}

/// One phase bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhasePoint {
    pub frequency: f64,
    /// Raw phase in degrees
    pub phase: f64,
    /// Sequentially unwrapped phase in degrees
    pub unwrapped_phase: f64,
    /// Seconds; absent for the first and last bin
    pub group_delay: Option<f64>,
}

/// One impulse-response sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpulsePoint {
    /// Seconds from window start
    pub time: f64,
    /// Normalized amplitude
    pub amplitude: f64,
}

/// Kind-specific point list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "points")]
pub enum MeasurementData {
    #[serde(rename = "spectrum")]
    Spectrum(Vec<SpectrumPoint>),
    #[serde(rename = "transfer")]
    TransferFunction(Vec<TransferPoint>),
    #[serde(rename = "phase")]
    Phase(Vec<PhasePoint>),
    #[serde(rename = "impulse")]
    ImpulseResponse(Vec<ImpulsePoint>),
}

impl MeasurementData {
    pub fn kind(&self) -> MeasurementKind {
        match self {
            MeasurementData::Spectrum(_) => MeasurementKind::Spectrum,
            MeasurementData::TransferFunction(_) => MeasurementKind::TransferFunction,
            MeasurementData::Phase(_) => MeasurementKind::Phase,
            MeasurementData::ImpulseResponse(_) => MeasurementKind::ImpulseResponse,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MeasurementData::Spectrum(p) => p.len(),
            MeasurementData::TransferFunction(p) => p.len(),
            MeasurementData::Phase(p) => p.len(),
            MeasurementData::ImpulseResponse(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frequency or time axis, in point order
    fn axis(&self) -> Vec<f64> {
        match self {
            MeasurementData::Spectrum(p) => p.iter().map(|p| p.frequency).collect(),
            MeasurementData::TransferFunction(p) => p.iter().map(|p| p.frequency).collect(),
            MeasurementData::Phase(p) => p.iter().map(|p| p.frequency).collect(),
            MeasurementData::ImpulseResponse(p) => p.iter().map(|p| p.time).collect(),
        }
    }

    fn validate(&self) -> Result<(), MeasurementError> {
        let kind = self.kind();
        if self.is_empty() {
            return Err(MeasurementError::Empty(kind));
        }

        let axis = self.axis();
        let frequency_indexed = kind.is_frequency_indexed();
        for (index, &value) in axis.iter().enumerate() {
            let in_domain = if frequency_indexed {
                value > 0.0
            } else {
                value >= 0.0
            };
            let increasing = index == 0 || value > axis[index - 1];
            if !value.is_finite() || !in_domain || !increasing {
                return Err(MeasurementError::InvalidAxis { kind, index });
            }
        }

        if !frequency_indexed {
            check_uniform_time_axis(&axis)?;
        }
        Ok(())
    }
}

/// Start at 0 s and keep every step within tolerance of the first one
///
/// `times` must already be finite and strictly increasing.
fn check_uniform_time_axis(times: &[f64]) -> Result<(), MeasurementError> {
    let [first, second, ..] = times else {
        return match times.first() {
            Some(&t) if t != 0.0 => Err(MeasurementError::ImpulseOffset(t)),
            _ => Ok(()),
        };
    };

    let step = second - first;
    let tolerance = step * IMPULSE_STEP_TOLERANCE;
    if first.abs() > tolerance {
        return Err(MeasurementError::ImpulseOffset(*first));
    }
    for (index, pair) in times.windows(2).enumerate().skip(1) {
        if ((pair[1] - pair[0]) - step).abs() > tolerance {
            return Err(MeasurementError::NonUniformStep(index + 1));
        }
    }
    Ok(())
}

/// One acquired or synthesized dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    id: Uuid,
    source: MeasurementSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    data: MeasurementData,
}

impl Measurement {
    /// Wrap generator output
    pub fn simulated(data: MeasurementData) -> Result<Self, MeasurementError> {
        Self::build(data, MeasurementSource::Simulated, None)
    }

    /// Wrap data parsed from `filename`
    pub fn from_file(
        data: MeasurementData,
        filename: impl Into<String>,
    ) -> Result<Self, MeasurementError> {
        Self::build(data, MeasurementSource::File, Some(filename.into()))
    }

    fn build(
        data: MeasurementData,
        source: MeasurementSource,
        filename: Option<String>,
    ) -> Result<Self, MeasurementError> {
        data.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            source,
            filename,
            timestamp: sab_common::time::now(),
            data,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> MeasurementKind {
        self.data.kind()
    }

    pub fn source(&self) -> MeasurementSource {
        self.source
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn data(&self) -> &MeasurementData {
        &self.data
    }

    /// Short description used in status reports
    pub fn summary(&self) -> MeasurementSummary {
        MeasurementSummary {
            id: self.id,
            kind: self.kind(),
            source: self.source,
            filename: self.filename.clone(),
            timestamp: self.timestamp,
            point_count: self.data.len(),
        }
    }
}

/// Header-only view of a measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSummary {
    pub id: Uuid,
    pub kind: MeasurementKind,
    pub source: MeasurementSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub point_count: usize,
}
