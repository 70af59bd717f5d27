//! Segment labels and the class-to-label table shipped with each model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three HCP attitudinal segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SegmentLabel {
    #[serde(rename = "gtx_champions")]
    GTxChampions,
    #[serde(rename = "risk_balancers")]
    RiskBalancers,
    #[serde(rename = "rwe_seekers")]
    RWESeekers,
}

impl SegmentLabel {
    pub const ALL: [SegmentLabel; 3] = [
        SegmentLabel::GTxChampions,
        SegmentLabel::RiskBalancers,
        SegmentLabel::RWESeekers,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            SegmentLabel::GTxChampions => "GTx Champions",
            SegmentLabel::RiskBalancers => "Risk Balancers",
            SegmentLabel::RWESeekers => "RWE Seekers",
        }
    }

    /// Header of this segment's confidence column in the response store.
    pub fn score_column(self) -> &'static str {
        match self {
            SegmentLabel::GTxChampions => "GTx_Champions_Score",
            SegmentLabel::RiskBalancers => "Risk_Balancers_Score",
            SegmentLabel::RWESeekers => "RWE_Seekers_Score",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SegmentLabel::GTxChampions => {
                "This HCP is likely an early adopter of gene therapies and is confident in prescribing them. They may be good candidates for early engagement with new gene therapy options."
            }
            SegmentLabel::RiskBalancers => {
                "This HCP is cautious about adopting new therapies and has concerns about safety. They may need additional safety data and reassurance before prescribing gene therapies."
            }
            SegmentLabel::RWESeekers => {
                "This HCP values real-world evidence and needs to see patient outcomes data before adopting new therapies. Sharing case studies and patient outcomes may be effective."
            }
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            SegmentLabel::GTxChampions => 0,
            SegmentLabel::RiskBalancers => 1,
            SegmentLabel::RWESeekers => 2,
        }
    }
}

impl fmt::Display for SegmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub class: i64,
    pub label: SegmentLabel,
}

/// Static mapping from the model's class values to segment labels.
///
/// The table is fixed when the model is fitted and travels inside the artifact.
/// Different deployments have used 0- and 1-based class values for the same
/// segments; a table is only meaningful next to the model it shipped with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTable {
    pub entries: Vec<LabelEntry>,
}

impl LabelTable {
    fn starting_at(first: i64) -> Self {
        LabelTable {
            entries: SegmentLabel::ALL
                .into_iter()
                .zip(first..)
                .map(|(label, class)| LabelEntry { class, label })
                .collect(),
        }
    }

    /// {0: GTx Champions, 1: Risk Balancers, 2: RWE Seekers}
    pub fn zero_based() -> Self {
        Self::starting_at(0)
    }

    /// {1: GTx Champions, 2: Risk Balancers, 3: RWE Seekers}
    pub fn one_based() -> Self {
        Self::starting_at(1)
    }

    pub fn decode(&self, class: i64) -> Option<SegmentLabel> {
        self.entries
            .iter()
            .find(|e| e.class == class)
            .map(|e| e.label)
    }

    /// Every label exactly once, every class value exactly once.
    pub fn check(&self) -> Result<(), String> {
        if self.entries.len() != SegmentLabel::ALL.len() {
            return Err(format!(
                "label table has {} entries, expected {}",
                self.entries.len(),
                SegmentLabel::ALL.len()
            ));
        }
        for label in SegmentLabel::ALL {
            if self.entries.iter().filter(|e| e.label == label).count() != 1 {
                return Err(format!("label {label} must appear exactly once"));
            }
        }
        for e in &self.entries {
            if self.entries.iter().filter(|o| o.class == e.class).count() != 1 {
                return Err(format!("class {} is mapped more than once", e.class));
            }
        }
        Ok(())
    }
}

/// Per-segment confidence, always stored in [`SegmentLabel::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentScores([f64; 3]);

impl SegmentScores {
    pub(crate) fn from_slots(slots: [f64; 3]) -> Self {
        SegmentScores(slots)
    }

    pub fn get(&self, label: SegmentLabel) -> f64 {
        self.0[label.slot()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentLabel, f64)> + '_ {
        SegmentLabel::ALL.into_iter().map(|l| (l, self.get(l)))
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}
