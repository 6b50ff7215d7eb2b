//! Time alignment and reflections

use serde::Serialize;

use super::recommendations::{Finding, Verdict};
use super::{non_empty, AnalysisError};
use crate::dsp;
use crate::measurement::{ImpulsePoint, MeasurementKind};

/// Later samples above this fraction of peak count as reflections
const REFLECTION_FRACTION: f64 = 0.1;
/// More reflections than this is flagged
const MAX_REFLECTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAlignment {
    /// Time of the peak sample in seconds
    pub main_arrival: f64,
    pub decay_time: f64,
    pub reflection_count: usize,
    pub issue: Verdict,
    pub recommendations: Vec<&'static str>,
}

pub fn analyze_time_alignment(impulse: &[ImpulsePoint]) -> Result<TimeAlignment, AnalysisError> {
    non_empty(impulse, MeasurementKind::ImpulseResponse)?;

    // First sample holding the largest signed amplitude
    let (peak_index, peak) = impulse
        .iter()
        .enumerate()
        .fold((0, &impulse[0]), |best, (i, p)| {
            if p.amplitude > best.1.amplitude {
                (i, p)
            } else {
                best
            }
        });

    let threshold = peak.amplitude * REFLECTION_FRACTION;
    let reflection_count = impulse[peak_index + 1..]
        .iter()
        .filter(|p| p.amplitude > threshold)
        .count();
    let issue = Verdict::flag(
        reflection_count > MAX_REFLECTIONS,
        Finding::ExcessiveReflections,
    );

    Ok(TimeAlignment {
        main_arrival: peak.time,
        decay_time: dsp::decay_time(impulse),
        reflection_count,
        issue,
        recommendations: issue.advice(),
    })
}
