use crate::{
    scenario::Scenario,
    scoring::ScoreBoard,
    turn::{SpeakerRole, Turn},
};
use serde::Serialize;

/// The mutable state of one training session.
///
/// The transcript is strictly chronological: turns are only appended, or
/// the whole transcript is replaced when a scenario (re)starts. Scores
/// survive scenario restarts and are only cleared by a full reset.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    scenario: Scenario,
    transcript: Vec<Turn>,
    scores: ScoreBoard,
    teacher_turns_submitted: usize,
}

impl Session {
    /// Creates a session positioned on `scenario` with its seed transcript.
    pub fn new(scenario: Scenario) -> Self {
        let transcript = scenario.seed_transcript.clone();
        Self {
            scenario,
            transcript,
            scores: ScoreBoard::new(),
            teacher_turns_submitted: 0,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    /// Teacher turns submitted since the last full reset, across restarts.
    pub fn teacher_turns_submitted(&self) -> usize {
        self.teacher_turns_submitted
    }

    /// Switches to `scenario` with a fresh transcript. Scores are kept.
    pub fn restart(&mut self, scenario: Scenario, transcript: Vec<Turn>) {
        self.scenario = scenario;
        self.transcript = transcript;
    }

    pub fn append(&mut self, turn: Turn) {
        if turn.speaker_role == SpeakerRole::Teacher {
            self.teacher_turns_submitted += 1;
        }
        self.transcript.push(turn);
    }

    /// Records the score for the most recent teacher turn.
    pub fn record_score(&mut self, score: u32) {
        debug_assert!(
            self.scores.len() < self.teacher_turns_submitted,
            "more scores than teacher turns"
        );
        self.scores.record(score);
    }

    /// Full restart: forgets every score.
    pub fn clear_scores(&mut self) {
        self.scores.clear();
        self.teacher_turns_submitted = 0;
    }
}
