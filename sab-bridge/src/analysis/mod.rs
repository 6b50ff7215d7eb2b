//! Alignment analysis engine
//!
//! Pure functions over measurement point slices. Each sub-analysis runs a
//! threshold scan and reports a [`Verdict`]: `"Good"` or a fixed issue
//! label. [`AlignmentReport`] combines the six sub-analyses with the
//! report-level recommendation list derived from the same advisory table
//! (see [`recommendations`]).

pub mod coherence;
pub mod crossover;
pub mod frequency;
pub mod phase;
pub mod recommendations;
pub mod room;
pub mod time;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::measurement::{
    ImpulsePoint, Measurement, MeasurementData, MeasurementKind, PhasePoint, SpectrumPoint,
    TransferPoint,
};

pub use coherence::{analyze_system_coherence, SystemCoherence};
pub use crossover::{analyze_crossover_alignment, CrossoverAlignment, CrossoverPoint};
pub use frequency::{analyze_frequency_response, BandAnalysis, FrequencyResponseAnalysis};
pub use phase::{analyze_phase_alignment, PhaseAlignment};
pub use recommendations::{Finding, Verdict};
pub use room::{analyze_room_acoustics, RoomAcoustics, RoomMode};
pub use time::{analyze_time_alignment, TimeAlignment};

/// Analysis input errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// Zero-length measurement
    #[error("cannot analyze an empty {0} measurement")]
    EmptyInput(MeasurementKind),

    /// Measurement of the wrong kind passed to an analysis
    #[error("expected a {expected} measurement, got {found}")]
    KindMismatch {
        expected: MeasurementKind,
        found: MeasurementKind,
    },
}

pub(crate) fn non_empty<T>(points: &[T], kind: MeasurementKind) -> Result<(), AnalysisError> {
    if points.is_empty() {
        Err(AnalysisError::EmptyInput(kind))
    } else {
        Ok(())
    }
}

fn mismatch(expected: MeasurementKind, data: &MeasurementData) -> AnalysisError {
    AnalysisError::KindMismatch {
        expected,
        found: data.kind(),
    }
}

impl MeasurementData {
    pub fn as_spectrum(&self) -> Result<&[SpectrumPoint], AnalysisError> {
        match self {
            MeasurementData::Spectrum(points) => Ok(points),
            other => Err(mismatch(MeasurementKind::Spectrum, other)),
        }
    }

    pub fn as_transfer(&self) -> Result<&[TransferPoint], AnalysisError> {
        match self {
            MeasurementData::TransferFunction(points) => Ok(points),
            other => Err(mismatch(MeasurementKind::TransferFunction, other)),
        }
    }

    pub fn as_phase(&self) -> Result<&[PhasePoint], AnalysisError> {
        match self {
            MeasurementData::Phase(points) => Ok(points),
            other => Err(mismatch(MeasurementKind::Phase, other)),
        }
    }

    pub fn as_impulse(&self) -> Result<&[ImpulsePoint], AnalysisError> {
        match self {
            MeasurementData::ImpulseResponse(points) => Ok(points),
            other => Err(mismatch(MeasurementKind::ImpulseResponse, other)),
        }
    }
}

/// The four measurements a full report is computed from
#[derive(Debug, Clone, Copy)]
pub struct AlignmentInputs<'a> {
    pub spectrum: &'a [SpectrumPoint],
    pub transfer: &'a [TransferPoint],
    pub phase: &'a [PhasePoint],
    pub impulse: &'a [ImpulsePoint],
}

impl<'a> AlignmentInputs<'a> {
    /// Borrow point slices, checking each measurement's kind
    pub fn from_measurements(
        spectrum: &'a Measurement,
        transfer: &'a Measurement,
        phase: &'a Measurement,
        impulse: &'a Measurement,
    ) -> Result<Self, AnalysisError> {
        Ok(Self {
            spectrum: spectrum.data().as_spectrum()?,
            transfer: transfer.data().as_transfer()?,
            phase: phase.data().as_phase()?,
            impulse: impulse.data().as_impulse()?,
        })
    }
}

/// Six sub-analyses plus the report-level recommendation list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentReport {
    pub frequency_response: FrequencyResponseAnalysis,
    pub phase_alignment: PhaseAlignment,
    pub time_alignment: TimeAlignment,
    pub crossover_alignment: CrossoverAlignment,
    pub room_acoustics: RoomAcoustics,
    pub system_coherence: SystemCoherence,
    /// One line per flagged category, fixed order, no duplicates
    pub recommendations: Vec<&'static str>,
}

impl AlignmentReport {
    pub fn analyze(inputs: AlignmentInputs<'_>) -> Result<Self, AnalysisError> {
        let frequency_response = analyze_frequency_response(inputs.spectrum)?;
        let phase_alignment = analyze_phase_alignment(inputs.phase)?;
        let time_alignment = analyze_time_alignment(inputs.impulse)?;
        let crossover_alignment = analyze_crossover_alignment(inputs.transfer)?;
        let room_acoustics = analyze_room_acoustics(inputs.spectrum, inputs.impulse)?;
        let system_coherence = analyze_system_coherence(inputs.transfer)?;

        let mut report = Self {
            frequency_response,
            phase_alignment,
            time_alignment,
            crossover_alignment,
            room_acoustics,
            system_coherence,
            recommendations: Vec::new(),
        };
        let summary = recommendations::summarize(report.verdicts());
        report.recommendations = summary;
        Ok(report)
    }

    /// Every category verdict, in summary order
    pub fn verdicts(&self) -> Vec<&Verdict> {
        let mut verdicts = self.frequency_response.verdicts().to_vec();
        verdicts.extend([
            &self.phase_alignment.issue,
            &self.time_alignment.issue,
            &self.crossover_alignment.issue,
            &self.room_acoustics.issue,
            &self.system_coherence.issue,
        ]);
        verdicts
    }
}

/// Report-level recommendations for four measurements
pub fn generate_alignment_recommendations(
    inputs: AlignmentInputs<'_>,
) -> Result<Vec<&'static str>, AnalysisError> {
    Ok(AlignmentReport::analyze(inputs)?.recommendations)
}

/// A report with the time it was produced and the measurements behind it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentSnapshot {
    pub timestamp: DateTime<Utc>,
    pub spectrum_id: Uuid,
    pub transfer_id: Uuid,
    pub phase_id: Uuid,
    pub impulse_id: Uuid,
    #[serde(flatten)]
    pub report: AlignmentReport,
}

impl AlignmentSnapshot {
    pub fn from_measurements(
        spectrum: &Measurement,
        transfer: &Measurement,
        phase: &Measurement,
        impulse: &Measurement,
    ) -> Result<Self, AnalysisError> {
        let inputs = AlignmentInputs::from_measurements(spectrum, transfer, phase, impulse)?;
        Ok(Self {
            timestamp: sab_common::time::now(),
            spectrum_id: spectrum.id(),
            transfer_id: transfer.id(),
            phase_id: phase.id(),
            impulse_id: impulse.id(),
            report: AlignmentReport::analyze(inputs)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::generator::Generator;

    fn simulated(kind: MeasurementKind, generator: &mut Generator) -> Measurement {
        Measurement::simulated(generator.generate(kind, &BridgeConfig::default())).unwrap()
    }

    #[test]
    fn test_simulated_report_is_complete() {
        let mut generator = Generator::from_seed(Some(11), true);
        let spectrum = simulated(MeasurementKind::Spectrum, &mut generator);
        let transfer = simulated(MeasurementKind::TransferFunction, &mut generator);
        let phase = simulated(MeasurementKind::Phase, &mut generator);
        let impulse = simulated(MeasurementKind::ImpulseResponse, &mut generator);

        let snapshot =
            AlignmentSnapshot::from_measurements(&spectrum, &transfer, &phase, &impulse).unwrap();
        assert_eq!(snapshot.spectrum_id, spectrum.id());

        let report = &snapshot.report;
        let mut seen = std::collections::HashSet::new();
        assert!(report.recommendations.iter().all(|r| seen.insert(*r)));
        assert_eq!(report.verdicts().len(), 8);

        let json = serde_json::to_value(&snapshot).unwrap();
        for key in [
            "frequencyResponse",
            "phaseAlignment",
            "timeAlignment",
            "crossoverAlignment",
            "roomAcoustics",
            "systemCoherence",
            "recommendations",
            "timestamp",
            "impulseId",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_deterministic_report_flags_known_categories() {
        let mut generator = Generator::deterministic();
        let spectrum = simulated(MeasurementKind::Spectrum, &mut generator);
        let transfer = simulated(MeasurementKind::TransferFunction, &mut generator);
        let phase = simulated(MeasurementKind::Phase, &mut generator);
        let impulse = simulated(MeasurementKind::ImpulseResponse, &mut generator);

        let inputs =
            AlignmentInputs::from_measurements(&spectrum, &transfer, &phase, &impulse).unwrap();
        let report = AlignmentReport::analyze(inputs).unwrap();

        assert!(report.frequency_response.verdicts().iter().all(|v| v.is_good()));
        // Raw phase stays within ±50° over the whole sweep
        assert!(report.phase_alignment.issue.is_good());
        assert!(report.crossover_alignment.issue.is_good());
        assert!(report.system_coherence.issue.is_good());
        // The slow main decay keeps most later samples above 10% of peak
        assert_eq!(
            report.time_alignment.issue,
            Verdict::Issue(Finding::ExcessiveReflections)
        );
        // Low-band room gain lifts far more than three bins over mean + 6 dB
        assert_eq!(report.room_acoustics.issue, Verdict::Issue(Finding::RoomModes));

        assert_eq!(
            report.recommendations,
            vec![
                "Adjust speaker delay settings",
                "Consider bass trapping for low frequency modes"
            ]
        );
        assert_eq!(
            generate_alignment_recommendations(inputs).unwrap(),
            report.recommendations
        );
    }

    #[test]
    fn test_kind_mismatch() {
        let mut generator = Generator::deterministic();
        let spectrum = simulated(MeasurementKind::Spectrum, &mut generator);
        let impulse = simulated(MeasurementKind::ImpulseResponse, &mut generator);

        let err = AlignmentInputs::from_measurements(&impulse, &spectrum, &spectrum, &impulse)
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::KindMismatch {
                expected: MeasurementKind::Spectrum,
                found: MeasurementKind::ImpulseResponse
            }
        );
    }
}
