//! Phase alignment

use serde::Serialize;

use super::recommendations::{Finding, Verdict};
use super::{non_empty, AnalysisError};
use crate::dsp;
use crate::measurement::{MeasurementKind, PhasePoint};

/// Any |phase| above this many degrees is flagged
const PHASE_LIMIT_DEG: f64 = 90.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseAlignment {
    pub avg_phase: f64,
    pub range: PhaseRange,
    pub issue: Verdict,
    /// Interior group-delay values in seconds, in frequency order
    pub group_delay: Vec<f64>,
    pub recommendations: Vec<&'static str>,
}

pub fn analyze_phase_alignment(phase: &[PhasePoint]) -> Result<PhaseAlignment, AnalysisError> {
    non_empty(phase, MeasurementKind::Phase)?;

    let values = phase.iter().map(|p| p.phase);
    let avg_phase = dsp::mean(values.clone()).unwrap_or_default();
    let (min, max) = dsp::min_max(values).unwrap_or_default();
    let issue = Verdict::flag(
        phase.iter().any(|p| p.phase.abs() > PHASE_LIMIT_DEG),
        Finding::PhaseIssues,
    );

    Ok(PhaseAlignment {
        avg_phase,
        range: PhaseRange { min, max },
        issue,
        group_delay: phase.iter().filter_map(|p| p.group_delay).collect(),
        recommendations: issue.advice(),
    })
}
