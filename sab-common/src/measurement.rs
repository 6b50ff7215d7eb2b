//! Measurement vocabulary shared by the bridge, its events and its front ends

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Kind of acoustic measurement
///
/// Serialized with the short names front ends already send in
/// `?type=` query strings (`spectrum`, `transfer`, `phase`, `impulse`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementKind {
    /// Level vs. frequency
    #[serde(rename = "spectrum")]
    Spectrum,
    /// Magnitude + phase between reference and measured signal
    #[serde(rename = "transfer", alias = "transfer_function")]
    TransferFunction,
    /// Phase vs. frequency, with unwrapped phase and group delay
    #[serde(rename = "phase")]
    Phase,
    /// Amplitude vs. time
    #[serde(rename = "impulse", alias = "impulse_response")]
    ImpulseResponse,
}

impl MeasurementKind {
    /// All kinds, in the order an alignment report requests them
    pub const ALL: [MeasurementKind; 4] = [
        MeasurementKind::Spectrum,
        MeasurementKind::TransferFunction,
        MeasurementKind::Phase,
        MeasurementKind::ImpulseResponse,
    ];

    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementKind::Spectrum => "spectrum",
            MeasurementKind::TransferFunction => "transfer",
            MeasurementKind::Phase => "phase",
            MeasurementKind::ImpulseResponse => "impulse",
        }
    }

    /// True for kinds whose points are indexed by frequency
    pub fn is_frequency_indexed(&self) -> bool {
        !matches!(self, MeasurementKind::ImpulseResponse)
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spectrum" => Ok(MeasurementKind::Spectrum),
            "transfer" | "transfer_function" => Ok(MeasurementKind::TransferFunction),
            "phase" => Ok(MeasurementKind::Phase),
            "impulse" | "impulse_response" => Ok(MeasurementKind::ImpulseResponse),
            other => Err(Error::InvalidInput(format!(
                "unknown measurement type '{}'",
                other
            ))),
        }
    }
}

/// Where a measurement's data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSource {
    /// Parsed from a capture-software data file
    File,
    /// Synthesized by the parametric generator
    Simulated,
}

impl fmt::Display for MeasurementSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementSource::File => f.write_str("file"),
            MeasurementSource::Simulated => f.write_str("simulated"),
        }
    }
}
