//! Frequency-band balance

use serde::Serialize;

use super::recommendations::{Finding, Verdict};
use super::{non_empty, AnalysisError};
use crate::dsp;
use crate::measurement::{MeasurementKind, SpectrumPoint};

/// Upper edge of the low band in Hz (exclusive)
pub const LOW_BAND_EDGE_HZ: f64 = 200.0;
/// Upper edge of the mid band in Hz (exclusive)
pub const MID_BAND_EDGE_HZ: f64 = 2000.0;

/// Any low-band level below this is rolloff
const LOW_ROLLOFF_DB: f64 = -10.0;
/// Any mid-band |level| above this is an irregularity
const MID_DEVIATION_DB: f64 = 6.0;
/// Any high-band level below this is rolloff
const HIGH_ROLLOFF_DB: f64 = -15.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallLevel {
    pub avg: f64,
    pub peak: f64,
    pub dynamic_range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandAnalysis {
    /// `None` when no bin falls in the band
    pub avg: Option<f64>,
    pub issue: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyResponseAnalysis {
    pub overall: OverallLevel,
    pub low: BandAnalysis,
    pub mid: BandAnalysis,
    pub high: BandAnalysis,
}

impl FrequencyResponseAnalysis {
    pub fn verdicts(&self) -> [&Verdict; 3] {
        [&self.low.issue, &self.mid.issue, &self.high.issue]
    }
}

fn band(
    spectrum: &[SpectrumPoint],
    range: impl Fn(f64) -> bool,
    flagged: impl Fn(f64) -> bool,
    finding: Finding,
) -> BandAnalysis {
    let levels: Vec<f64> = spectrum
        .iter()
        .filter(|p| range(p.frequency))
        .map(|p| p.level)
        .collect();
    BandAnalysis {
        avg: dsp::mean(levels.iter().copied()),
        issue: Verdict::flag(levels.iter().any(|&l| flagged(l)), finding),
    }
}

/// Overall level statistics and per-band threshold checks
pub fn analyze_frequency_response(
    spectrum: &[SpectrumPoint],
) -> Result<FrequencyResponseAnalysis, AnalysisError> {
    non_empty(spectrum, MeasurementKind::Spectrum)?;

    let levels = spectrum.iter().map(|p| p.level);
    let avg = dsp::mean(levels.clone()).unwrap_or_default();
    let (min, peak) = dsp::min_max(levels).unwrap_or_default();

    Ok(FrequencyResponseAnalysis {
        overall: OverallLevel {
            avg,
            peak,
            dynamic_range: peak - min,
        },
        low: band(
            spectrum,
            |f| f < LOW_BAND_EDGE_HZ,
            |l| l < LOW_ROLLOFF_DB,
            Finding::LowFrequencyRolloff,
        ),
        mid: band(
            spectrum,
            |f| (LOW_BAND_EDGE_HZ..MID_BAND_EDGE_HZ).contains(&f),
            |l| l.abs() > MID_DEVIATION_DB,
            Finding::MidFrequencyIrregularities,
        ),
        high: band(
            spectrum,
            |f| f >= MID_BAND_EDGE_HZ,
            |l| l < HIGH_ROLLOFF_DB,
            Finding::HighFrequencyRolloff,
        ),
    })
}
