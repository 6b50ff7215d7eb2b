//! Measurement coherence

use serde::Serialize;

use super::recommendations::{Finding, Verdict};
use super::{non_empty, AnalysisError};
use crate::dsp;
use crate::measurement::{MeasurementKind, TransferPoint};

/// Bins below this coherence are unreliable
const LOW_COHERENCE: f64 = 0.7;
/// Flag when more than this share of bins is unreliable
const MAX_LOW_SHARE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemCoherence {
    pub avg_coherence: f64,
    pub low_coherence_count: usize,
    pub issue: Verdict,
    pub recommendations: Vec<&'static str>,
}

pub fn analyze_system_coherence(
    transfer: &[TransferPoint],
) -> Result<SystemCoherence, AnalysisError> {
    non_empty(transfer, MeasurementKind::TransferFunction)?;

    let low_coherence_count = transfer
        .iter()
        .filter(|p| p.coherence < LOW_COHERENCE)
        .count();
    let issue = Verdict::flag(
        low_coherence_count as f64 > transfer.len() as f64 * MAX_LOW_SHARE,
        Finding::CoherenceIssues,
    );

    Ok(SystemCoherence {
        avg_coherence: dsp::mean(transfer.iter().map(|p| p.coherence)).unwrap_or_default(),
        low_coherence_count,
        issue,
        recommendations: issue.advice(),
    })
}
