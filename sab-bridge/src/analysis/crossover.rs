//! Crossover detection by local slope

use serde::Serialize;

use super::recommendations::{Finding, Verdict};
use super::{non_empty, AnalysisError};
use crate::dsp;
use crate::measurement::{MeasurementKind, TransferPoint};

/// Centered slope magnitude, in dB per Hz, that marks a crossover point
const SLOPE_LIMIT: f64 = 3.0;
/// More crossover points than this is flagged
const MAX_CROSSOVER_POINTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossoverPoint {
    pub frequency: f64,
    pub slope: f64,
    pub magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossoverAlignment {
    pub crossover_points: Vec<CrossoverPoint>,
    pub avg_magnitude: f64,
    /// Max minus min magnitude
    pub magnitude_variation: f64,
    pub issue: Verdict,
    pub recommendations: Vec<&'static str>,
}

pub fn analyze_crossover_alignment(
    transfer: &[TransferPoint],
) -> Result<CrossoverAlignment, AnalysisError> {
    non_empty(transfer, MeasurementKind::TransferFunction)?;

    let crossover_points: Vec<CrossoverPoint> = transfer
        .windows(3)
        .filter_map(|w| {
            let slope = (w[2].magnitude - w[0].magnitude) / (w[2].frequency - w[0].frequency);
            (slope.abs() > SLOPE_LIMIT).then_some(CrossoverPoint {
                frequency: w[1].frequency,
                slope,
                magnitude: w[1].magnitude,
            })
        })
        .collect();

    let magnitudes = transfer.iter().map(|p| p.magnitude);
    let avg_magnitude = dsp::mean(magnitudes.clone()).unwrap_or_default();
    let (min, max) = dsp::min_max(magnitudes).unwrap_or_default();
    let issue = Verdict::flag(
        crossover_points.len() > MAX_CROSSOVER_POINTS,
        Finding::MultipleCrossoverPoints,
    );

    Ok(CrossoverAlignment {
        crossover_points,
        avg_magnitude,
        magnitude_variation: max - min,
        issue,
        recommendations: issue.advice(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(points: &[(f64, f64)]) -> Vec<TransferPoint> {
        points
            .iter()
            .map(|&(frequency, magnitude)| TransferPoint {
                frequency,
                magnitude,
                phase: 0.0,
                coherence: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_flat_transfer_has_no_crossover_points() {
        let flat = transfer(&[(1.0, 5.0), (2.0, 5.0), (3.0, 5.0), (4.0, 5.0)]);
        let analysis = analyze_crossover_alignment(&flat).unwrap();
        assert!(analysis.crossover_points.is_empty());
        assert!(analysis.issue.is_good());
        assert_eq!(analysis.avg_magnitude, 5.0);
        assert_eq!(analysis.magnitude_variation, 0.0);
    }

    #[test]
    fn test_steep_step_is_detected() {
        // Slope at 2 Hz is (20 - 0) / (3 - 1) = 10 dB/Hz
        let data = transfer(&[(1.0, 0.0), (2.0, 10.0), (3.0, 20.0), (4.0, 20.0)]);
        let analysis = analyze_crossover_alignment(&data).unwrap();
        assert_eq!(analysis.crossover_points.len(), 2);
        assert_eq!(analysis.crossover_points[0].frequency, 2.0);
        assert_eq!(analysis.crossover_points[0].slope, 10.0);
        assert!(analysis.issue.is_good());
    }

    #[test]
    fn test_many_steep_points_flagged() {
        // 10 dB/Hz ramp: every interior point is steep
        let data: Vec<(f64, f64)> = (1..=10).map(|i| (i as f64, i as f64 * 10.0)).collect();
        let analysis = analyze_crossover_alignment(&transfer(&data)).unwrap();
        assert_eq!(analysis.crossover_points.len(), 8);
        assert_eq!(
            analysis.issue,
            Verdict::Issue(Finding::MultipleCrossoverPoints)
        );
    }

    #[test]
    fn test_short_input_has_no_interior() {
        let analysis = analyze_crossover_alignment(&transfer(&[(1.0, 0.0), (2.0, 50.0)])).unwrap();
        assert!(analysis.crossover_points.is_empty());
    }
}
