//! Room modes and reverberation

use serde::Serialize;

use super::recommendations::{Finding, Verdict};
use super::{non_empty, AnalysisError};
use crate::dsp;
use crate::measurement::{ImpulsePoint, MeasurementKind, SpectrumPoint};

/// Level above the spectrum mean that marks a mode, in dB
const MODE_EXCESS_DB: f64 = 6.0;
/// More modes than this is flagged
const MAX_ROOM_MODES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomMode {
    pub frequency: f64,
    pub level: f64,
    /// dB above the spectrum mean
    pub severity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAcoustics {
    pub room_modes: Vec<RoomMode>,
    /// Seconds, see [`dsp::decay_time`]
    pub reverb_time: f64,
    pub issue: Verdict,
    pub recommendations: Vec<&'static str>,
}

pub fn analyze_room_acoustics(
    spectrum: &[SpectrumPoint],
    impulse: &[ImpulsePoint],
) -> Result<RoomAcoustics, AnalysisError> {
    non_empty(spectrum, MeasurementKind::Spectrum)?;
    non_empty(impulse, MeasurementKind::ImpulseResponse)?;

    let mean_level = dsp::mean(spectrum.iter().map(|p| p.level)).unwrap_or_default();
    let room_modes: Vec<RoomMode> = spectrum
        .iter()
        .filter(|p| p.level > mean_level + MODE_EXCESS_DB)
        .map(|p| RoomMode {
            frequency: p.frequency,
            level: p.level,
            severity: p.level - mean_level,
        })
        .collect();
    let issue = Verdict::flag(room_modes.len() > MAX_ROOM_MODES, Finding::RoomModes);

    Ok(RoomAcoustics {
        room_modes,
        reverb_time: dsp::decay_time(impulse),
        issue,
        recommendations: issue.advice(),
    })
}
