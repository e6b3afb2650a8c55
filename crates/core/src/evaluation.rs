use serde::{Deserialize, Serialize};
use std::{fmt, ops::Range};

/// Qualitative rating given to a single rubric criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Exemplary,
    Meets,
    NeedsImprovement,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Exemplary, Tier::Meets, Tier::NeedsImprovement];

    /// The label the model is asked to use for this tier.
    pub fn label(self) -> &'static str {
        match self {
            Tier::Exemplary => "EXEMPLARY",
            Tier::Meets => "MEETS EXPECTATIONS",
            Tier::NeedsImprovement => "ROOM FOR IMPROVEMENT",
        }
    }

    /// Case-insensitive lookup of a rubric label.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.split_whitespace().collect::<Vec<_>>().join(" ");
        Tier::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(&normalized))
    }

    /// Rubric points awarded for this tier.
    pub fn points(self) -> u32 {
        match self {
            Tier::Exemplary => 20,
            Tier::Meets => 15,
            Tier::NeedsImprovement => 10,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Tier::Exemplary => Severity::Green,
            Tier::Meets => Severity::Yellow,
            Tier::NeedsImprovement => Severity::Red,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Traffic-light colour used to display a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionRating {
    pub name: String,
    pub tier: Tier,
}

/// The structured reading of one feedback completion.
///
/// Only `overall_score` outlives the turn it was produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub criteria: Vec<CriterionRating>,
    /// Percentage 0-100; `None` when the completion carried no usable score.
    pub overall_score: Option<u32>,
    pub comment: String,
}

/// One occurrence of a tier label inside free text, for highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityMarker {
    pub tier: Tier,
    pub severity: Severity,
    /// Byte range of the label in the source text.
    pub span: Range<usize>,
}
