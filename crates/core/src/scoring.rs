//! Scoring Aggregator
//!
//! Keeps every score extracted from feedback, on a 0-100 percentage scale,
//! and derives the running average, progress and performance tier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of scored responses that counts as a full progress bar.
pub const RESPONSES_FOR_FULL_PROGRESS: usize = 10;

/// Lower bounds of each performance tier, best first. Must stay descending
/// so that a higher average never maps to a lower tier.
const PERFORMANCE_CUTOFFS: [(f64, PerformanceTier); 4] = [
    (90.0, PerformanceTier::Excellent),
    (80.0, PerformanceTier::VeryGood),
    (70.0, PerformanceTier::Good),
    (60.0, PerformanceTier::Satisfactory),
];

/// Overall performance band, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    NeedsImprovement,
    Satisfactory,
    Good,
    VeryGood,
    Excellent,
}

impl PerformanceTier {
    pub fn for_average(average: f64) -> Self {
        PERFORMANCE_CUTOFFS
            .iter()
            .find(|(floor, _)| average >= *floor)
            .map(|(_, tier)| *tier)
            .unwrap_or(PerformanceTier::NeedsImprovement)
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PerformanceTier::Excellent => "Excellent",
            PerformanceTier::VeryGood => "Very Good",
            PerformanceTier::Good => "Good",
            PerformanceTier::Satisfactory => "Satisfactory",
            PerformanceTier::NeedsImprovement => "Needs Improvement",
        };
        f.write_str(label)
    }
}

/// How a single feedback score reads at a glance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackTone {
    Positive,
    Neutral,
    Negative,
}

impl FeedbackTone {
    pub fn for_score(score: u32) -> Self {
        match score {
            80.. => FeedbackTone::Positive,
            60..=79 => FeedbackTone::Neutral,
            _ => FeedbackTone::Negative,
        }
    }
}

/// The ordered list of scores recorded in a session. Only grows; cleared
/// only by a full restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBoard {
    scores: Vec<u32>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, score: u32) {
        self.scores.push(score);
    }

    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Mean of all scores, or 0 when nothing has been recorded.
    pub fn average(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let total: u64 = self.scores.iter().map(|&s| u64::from(s)).sum();
        total as f64 / self.scores.len() as f64
    }

    pub fn tier(&self) -> PerformanceTier {
        PerformanceTier::for_average(self.average())
    }

    /// Share of the progress bar filled, 0-100.
    pub fn progress_percent(&self) -> f64 {
        let filled = self.scores.len() as f64 / RESPONSES_FOR_FULL_PROGRESS as f64 * 100.0;
        filled.min(100.0)
    }

    pub(crate) fn clear(&mut self) {
        self.scores.clear();
    }
}
