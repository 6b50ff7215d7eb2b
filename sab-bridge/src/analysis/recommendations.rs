//! Advisory table
//!
//! Every issue label and every piece of advice the engine emits lives here.
//! Sub-analyses take their local advice from [`Finding::local_advice`]; the
//! report-level list takes one [`Finding::summary_advice`] per flagged
//! category.

use serde::{Serialize, Serializer};

/// A flagged condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finding {
    LowFrequencyRolloff,
    MidFrequencyIrregularities,
    HighFrequencyRolloff,
    PhaseIssues,
    ExcessiveReflections,
    MultipleCrossoverPoints,
    RoomModes,
    CoherenceIssues,
}

impl Finding {
    /// Summary order of the report-level list
    pub const ORDER: [Finding; 8] = [
        Finding::LowFrequencyRolloff,
        Finding::MidFrequencyIrregularities,
        Finding::HighFrequencyRolloff,
        Finding::PhaseIssues,
        Finding::ExcessiveReflections,
        Finding::MultipleCrossoverPoints,
        Finding::RoomModes,
        Finding::CoherenceIssues,
    ];

    /// Label reported in place of "Good"
    pub fn label(self) -> &'static str {
        match self {
            Finding::LowFrequencyRolloff => "Low frequency rolloff detected",
            Finding::MidFrequencyIrregularities => "Mid frequency irregularities",
            Finding::HighFrequencyRolloff => "High frequency rolloff detected",
            Finding::PhaseIssues => "Phase issues detected",
            Finding::ExcessiveReflections => "Excessive reflections detected",
            Finding::MultipleCrossoverPoints => "Multiple crossover points detected",
            Finding::RoomModes => "Room modes detected",
            Finding::CoherenceIssues => "Coherence issues detected",
        }
    }

    /// Advice attached to the sub-analysis that raised the finding
    pub fn local_advice(self) -> &'static [&'static str] {
        match self {
            Finding::LowFrequencyRolloff
            | Finding::MidFrequencyIrregularities
            | Finding::HighFrequencyRolloff => &[],
            Finding::PhaseIssues => &[
                "Check speaker polarity and phase relationships",
                "Verify crossover phase alignment",
            ],
            Finding::ExcessiveReflections => &[
                "Check speaker placement and room acoustics",
                "Consider acoustic treatment for reflections",
            ],
            Finding::MultipleCrossoverPoints => &[
                "Review crossover frequency settings",
                "Check phase alignment at crossover points",
            ],
            Finding::RoomModes => &[
                "Consider bass trapping for low frequency modes",
                "Review speaker placement relative to room dimensions",
            ],
            Finding::CoherenceIssues => &[
                "Check microphone placement and signal quality",
                "Verify measurement setup and noise levels",
            ],
        }
    }

    /// One-line advice for the report-level list
    pub fn summary_advice(self) -> &'static str {
        match self {
            Finding::LowFrequencyRolloff => "Apply low frequency boost or subwoofer alignment",
            Finding::MidFrequencyIrregularities => "Apply mid-frequency EQ correction",
            Finding::HighFrequencyRolloff => "Check high frequency driver alignment",
            Finding::PhaseIssues => "Adjust speaker phase relationships",
            Finding::ExcessiveReflections => "Adjust speaker delay settings",
            Finding::MultipleCrossoverPoints => "Review and adjust crossover settings",
            Finding::RoomModes => "Consider bass trapping for low frequency modes",
            Finding::CoherenceIssues => "Check microphone placement and signal quality",
        }
    }
}

/// Outcome of one threshold check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Good,
    Issue(Finding),
}

impl Verdict {
    pub fn flag(raised: bool, finding: Finding) -> Self {
        if raised {
            Verdict::Issue(finding)
        } else {
            Verdict::Good
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, Verdict::Good)
    }

    pub fn finding(&self) -> Option<Finding> {
        match self {
            Verdict::Good => None,
            Verdict::Issue(finding) => Some(*finding),
        }
    }

    /// `"Good"` or the finding label
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Good => "Good",
            Verdict::Issue(finding) => finding.label(),
        }
    }

    /// Local advice list for a sub-analysis
    pub fn advice(&self) -> Vec<&'static str> {
        self.finding()
            .map(|f| f.local_advice().to_vec())
            .unwrap_or_default()
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One summary line per flagged category, in [`Finding::ORDER`], no repeats
pub fn summarize<'a>(verdicts: impl IntoIterator<Item = &'a Verdict>) -> Vec<&'static str> {
    let mut flagged: Vec<Finding> = verdicts.into_iter().filter_map(Verdict::finding).collect();
    flagged.sort_by_key(|f| Finding::ORDER.iter().position(|o| o == f));

    let mut out: Vec<&'static str> = Vec::new();
    for finding in flagged {
        let advice = finding.summary_advice();
        if !out.contains(&advice) {
            out.push(advice);
        }
    }
    out
}
