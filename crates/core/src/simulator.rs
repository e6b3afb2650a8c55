//! Training Simulator
//!
//! Drives one training session: starts scenarios, accepts teacher responses,
//! requests feedback and the student reply in parallel, and keeps the
//! transcript and scores consistent. Front ends observe progress through an
//! optional event channel.

use crate::{
    evaluation::Evaluation,
    llm_client::{CompletionClient, CompletionKind, GatewayError},
    parser, prompt,
    scenario::{ScenarioCatalog, fallback_transcript},
    scoring::{FeedbackTone, PerformanceTier},
    session::Session,
    turn::Turn,
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Pause between showing feedback and revealing the student reply.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("{0}")]
    Validation(String),
    #[error("Scenario {0} does not exist")]
    UnknownScenario(usize),
    #[error("Error communicating with AI service: {0}")]
    Communication(#[from] GatewayError),
}

/// Notifications published while the session advances.
#[derive(Debug, Clone)]
pub enum SimulationEvent {
    /// A scenario (re)started; the transcript was replaced wholesale.
    TranscriptReset {
        scenario_title: String,
        transcript: Vec<Turn>,
    },
    TeacherTurn(Turn),
    Feedback {
        text: String,
        evaluation: Evaluation,
        tone: Option<FeedbackTone>,
    },
    /// Student turns appended after the reply delay.
    StudentTurns(Vec<Turn>),
    CommunicationError(String),
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub feedback_text: String,
    pub evaluation: Evaluation,
    pub student_turns: Vec<Turn>,
}

/// End-of-session statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub responses: usize,
    pub average: f64,
    pub tier: PerformanceTier,
    pub progress_percent: f64,
}

pub struct Simulator {
    session_id: Uuid,
    client: Arc<dyn CompletionClient>,
    catalog: ScenarioCatalog,
    current: usize,
    session: Session,
    reply_delay: Duration,
    events: Option<mpsc::Sender<SimulationEvent>>,
}

impl Simulator {
    /// Creates a simulator positioned on the first scenario. Call
    /// [`Simulator::start_scenario`] before submitting responses.
    pub fn new(
        client: Arc<dyn CompletionClient>,
        catalog: ScenarioCatalog,
    ) -> Result<Self, SimulationError> {
        let first = catalog
            .get(0)
            .cloned()
            .ok_or(SimulationError::UnknownScenario(0))?;
        Ok(Self {
            session_id: Uuid::new_v4(),
            client,
            catalog,
            current: 0,
            session: Session::new(first),
            reply_delay: DEFAULT_REPLY_DELAY,
            events: None,
        })
    }

    pub fn with_reply_delay(mut self, reply_delay: Duration) -> Self {
        self.reply_delay = reply_delay;
        self
    }

    /// Publishes progress events on `events`.
    ///
    /// Events are sent with `try_send`, so a full or closed channel never
    /// stalls the simulation; the event is dropped with a warning instead.
    /// Size the channel for at least the four events of one submission.
    pub fn with_events(mut self, events: mpsc::Sender<SimulationEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    pub fn current_scenario_index(&self) -> usize {
        self.current
    }

    /// Starts (or restarts) the scenario at `index`, replacing the
    /// transcript. Scores are kept.
    ///
    /// Scenarios without a seed transcript get a generated opening; any
    /// failure there falls back to the built-in transcript.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn start_scenario(&mut self, index: usize) -> Result<(), SimulationError> {
        let scenario = self
            .catalog
            .get(index)
            .cloned()
            .ok_or(SimulationError::UnknownScenario(index))?;

        let transcript = if scenario.seed_transcript.is_empty() {
            match self
                .client
                .complete(&prompt::dialog(&scenario), CompletionKind::Dialog)
                .await
            {
                Ok(text) => {
                    let turns = parser::parse_initial_dialog(&text);
                    if parser::is_fallback_transcript(&turns) {
                        warn!("Generated opening had no dialogue lines, using fallback transcript");
                    }
                    turns
                }
                Err(e) => {
                    warn!(error = %e, "Failed to generate opening dialogue, using fallback transcript");
                    fallback_transcript()
                }
            }
        } else {
            scenario.seed_transcript.clone()
        };

        info!(scenario = %scenario.title, turns = transcript.len(), "Scenario started");
        let event = SimulationEvent::TranscriptReset {
            scenario_title: scenario.title.clone(),
            transcript: transcript.clone(),
        };
        self.current = index;
        self.session.restart(scenario, transcript);
        self.emit(event);
        Ok(())
    }

    /// Moves to the following scenario, wrapping around after the last one.
    pub async fn next_scenario(&mut self) -> Result<(), SimulationError> {
        let next = (self.current + 1) % self.catalog.len();
        self.start_scenario(next).await
    }

    /// Full restart: clears every score and starts the first scenario.
    pub async fn reset(&mut self) -> Result<(), SimulationError> {
        self.session.clear_scores();
        self.start_scenario(0).await
    }

    /// Submits a teacher response.
    ///
    /// The teacher turn is appended before any network activity. Feedback
    /// and the student reply are requested concurrently; if either fails the
    /// turn records no score and no student turns.
    #[instrument(skip(self, response), fields(session_id = %self.session_id))]
    pub async fn submit(&mut self, response: &str) -> Result<SubmissionOutcome, SimulationError> {
        let response = response.trim();
        if response.is_empty() {
            return Err(SimulationError::Validation(
                "Please enter your response first.".to_string(),
            ));
        }

        let teacher_turn = Turn::teacher(response);
        self.session.append(teacher_turn.clone());
        self.emit(SimulationEvent::TeacherTurn(teacher_turn));

        let scenario = self.session.scenario();
        let transcript = self.session.transcript();
        let feedback_prompt = prompt::feedback(scenario, transcript, response);
        let student_prompt = prompt::student(scenario, transcript, response);

        let (feedback, reply) = tokio::join!(
            self.client.complete(&feedback_prompt, CompletionKind::Feedback),
            self.client.complete(&student_prompt, CompletionKind::Student),
        );
        let (feedback_text, reply_text) = match (feedback, reply) {
            (Ok(feedback), Ok(reply)) => (feedback, reply),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Completion request failed");
                self.emit(SimulationEvent::CommunicationError(
                    "Error communicating with AI service. Please try again.".to_string(),
                ));
                return Err(e.into());
            }
        };

        let evaluation = parser::parse_evaluation(&feedback_text);
        let tone = evaluation.overall_score.map(FeedbackTone::for_score);
        match evaluation.overall_score {
            Some(score) => {
                self.session.record_score(score);
                info!(score, responses = self.session.scores().len(), "Score recorded");
            }
            None => info!("Feedback carried no usable score"),
        }
        self.emit(SimulationEvent::Feedback {
            text: feedback_text.clone(),
            evaluation: evaluation.clone(),
            tone,
        });

        let student_turns = parser::parse_student_reply(&reply_text);
        if !student_turns.is_empty() {
            if !self.reply_delay.is_zero() {
                tokio::time::sleep(self.reply_delay).await;
            }
            for turn in &student_turns {
                self.session.append(turn.clone());
            }
            self.emit(SimulationEvent::StudentTurns(student_turns.clone()));
        }

        Ok(SubmissionOutcome {
            feedback_text,
            evaluation,
            student_turns,
        })
    }

    /// Asks the model for a short coaching hint on the current scenario.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn hint(&self) -> Result<String, SimulationError> {
        let text = self
            .client
            .complete(&prompt::hint(self.session.scenario()), CompletionKind::Hint)
            .await?;
        Ok(text.trim().to_string())
    }

    pub fn summary(&self) -> TrainingSummary {
        let scores = self.session.scores();
        TrainingSummary {
            responses: scores.len(),
            average: scores.average(),
            tier: scores.tier(),
            progress_percent: scores.progress_percent(),
        }
    }

    fn emit(&self, event: SimulationEvent) {
        let Some(tx) = &self.events else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Dropped simulation event: channel full.");
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Failed to publish simulation event: receiver dropped.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        llm_client::MockCompletionClient,
        scenario::Scenario,
        turn::SpeakerRole,
    };
    use approx::assert_relative_eq;

    const SEED_LINE: &str = "Two students are shouting near the back.";

    fn seeded_catalog() -> ScenarioCatalog {
        let scenario = |id: u32, title: &str| Scenario {
            id,
            title: title.to_string(),
            description: "A loud argument breaks out.".to_string(),
            seed_transcript: vec![
                Turn::system(SEED_LINE),
                Turn::student("Jordan", "You never help!"),
            ],
            context: "Mid-lesson.".to_string(),
        };
        ScenarioCatalog::new(vec![scenario(1, "First"), scenario(2, "Second")]).unwrap()
    }

    fn expect_turn(mock: &mut MockCompletionClient, feedback: &'static str, reply: &'static str) {
        mock.expect_complete()
            .withf(|_, kind| *kind == CompletionKind::Feedback)
            .times(1)
            .returning(move |_, _| Ok(feedback.to_string()));
        mock.expect_complete()
            .withf(|_, kind| *kind == CompletionKind::Student)
            .times(1)
            .returning(move |_, _| Ok(reply.to_string()));
    }

    async fn started(mock: MockCompletionClient) -> Simulator {
        let mut simulator = Simulator::new(Arc::new(mock), seeded_catalog())
            .unwrap()
            .with_reply_delay(Duration::ZERO);
        simulator.start_scenario(0).await.unwrap();
        simulator
    }

    #[tokio::test]
    async fn test_seeded_scenario_does_not_call_model() {
        let simulator = started(MockCompletionClient::new()).await;
        assert_eq!(simulator.session().transcript().len(), 2);
        assert_eq!(simulator.session().transcript()[0], Turn::system(SEED_LINE));
    }

    #[tokio::test]
    async fn test_generated_opening_is_parsed() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .withf(|prompt, kind| {
                *kind == CompletionKind::Dialog && prompt.contains("Alex and Jordan")
            })
            .times(1)
            .returning(|_, _| {
                Ok("system: \"Chairs scrape.\"\nstudent: \"Jordan: Back off!\"".to_string())
            });

        let mut simulator = Simulator::new(Arc::new(mock), ScenarioCatalog::builtin())
            .unwrap()
            .with_reply_delay(Duration::ZERO);
        simulator.start_scenario(0).await.unwrap();

        let transcript = simulator.session().transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].speaker_role, SpeakerRole::System);
        assert_eq!(transcript[1], Turn::student("Jordan", "Back off!"));
    }

    #[tokio::test]
    async fn test_failed_opening_uses_fallback() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .times(1)
            .returning(|_, _| Err(GatewayError::Transport("connection refused".to_string())));

        let mut simulator = Simulator::new(Arc::new(mock), ScenarioCatalog::builtin())
            .unwrap()
            .with_reply_delay(Duration::ZERO);
        simulator.start_scenario(0).await.unwrap();

        assert_eq!(simulator.session().transcript(), fallback_transcript().as_slice());
    }

    #[tokio::test]
    async fn test_unknown_scenario_is_rejected() {
        let mut simulator = started(MockCompletionClient::new()).await;
        let err = simulator.start_scenario(5).await.unwrap_err();
        assert!(matches!(err, SimulationError::UnknownScenario(5)));
        assert_eq!(simulator.current_scenario_index(), 0);
    }

    #[tokio::test]
    async fn test_blank_response_is_rejected_without_side_effects() {
        let mut simulator = started(MockCompletionClient::new()).await;
        let err = simulator.submit("   \n").await.unwrap_err();
        assert!(matches!(err, SimulationError::Validation(_)));
        assert_eq!(simulator.session().transcript().len(), 2);
        assert_eq!(simulator.session().teacher_turns_submitted(), 0);
    }

    #[tokio::test]
    async fn test_submit_appends_turns_and_records_score() {
        let mut mock = MockCompletionClient::new();
        expect_turn(
            &mut mock,
            "Empathy: EXEMPLARY\nOVERALL SCORE: 85%\nFEEDBACK: Calm and clear.",
            "[Jordan]: \"Fine, I'll sit.\"\n[Alex]: \"Whatever.\"",
        );
        let mut simulator = started(mock).await;

        let outcome = simulator.submit("  Both of you, stop now.  ").await.unwrap();

        assert_eq!(outcome.evaluation.overall_score, Some(85));
        assert_eq!(outcome.student_turns.len(), 2);
        let transcript = simulator.session().transcript();
        assert_eq!(transcript.len(), 5);
        assert_eq!(transcript[2], Turn::teacher("Both of you, stop now."));
        assert_eq!(transcript[3], Turn::student("Jordan", "Fine, I'll sit."));
        assert_eq!(transcript[4], Turn::student("Alex", "Whatever."));
        assert_eq!(simulator.session().scores().scores(), &[85]);
    }

    #[tokio::test]
    async fn test_prompts_see_teacher_turn_only_where_expected() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .withf(|prompt, kind| {
                *kind == CompletionKind::Feedback && prompt.contains("Teacher: \"Stop.\"")
            })
            .times(1)
            .returning(|_, _| Ok("OVERALL SCORE: 70%".to_string()));
        mock.expect_complete()
            .withf(|prompt, kind| {
                *kind == CompletionKind::Student && !prompt.contains("Teacher: \"Stop.\"")
            })
            .times(1)
            .returning(|_, _| Ok("[Jordan]: \"Okay.\"".to_string()));
        let mut simulator = started(mock).await;

        simulator.submit("Stop.").await.unwrap();
        assert_eq!(simulator.session().scores().scores(), &[70]);
    }

    #[tokio::test]
    async fn test_feedback_without_score_leaves_scores_untouched() {
        let mut mock = MockCompletionClient::new();
        expect_turn(&mut mock, "Good effort overall.", "Jordan: \"Fine.\"");
        let mut simulator = started(mock).await;

        let outcome = simulator.submit("Let's take a breath.").await.unwrap();

        assert_eq!(outcome.evaluation.overall_score, None);
        assert!(simulator.session().scores().is_empty());
        assert_eq!(simulator.session().transcript().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_completion_records_nothing() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .withf(|_, kind| *kind == CompletionKind::Feedback)
            .returning(|_, _| Ok("OVERALL SCORE: 90%".to_string()));
        mock.expect_complete()
            .withf(|_, kind| *kind == CompletionKind::Student)
            .returning(|_, _| {
                Err(GatewayError::Upstream {
                    status: 503,
                    message: "API request failed: 503".to_string(),
                })
            });
        let mut simulator = started(mock).await;

        let err = simulator.submit("Everyone sit down.").await.unwrap_err();

        assert!(matches!(
            err,
            SimulationError::Communication(GatewayError::Upstream { status: 503, .. })
        ));
        let transcript = simulator.session().transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[2], Turn::teacher("Everyone sit down."));
        assert!(simulator.session().scores().is_empty());
    }

    #[tokio::test]
    async fn test_undrained_event_channel_does_not_block_submission() {
        let mut mock = MockCompletionClient::new();
        expect_turn(&mut mock, "OVERALL SCORE: 90%", "Alex: Fine. Jordan: Whatever.");
        let (tx, mut rx) = mpsc::channel(1);
        let mut simulator = Simulator::new(Arc::new(mock), seeded_catalog())
            .unwrap()
            .with_reply_delay(Duration::ZERO)
            .with_events(tx);

        simulator.start_scenario(0).await.unwrap();
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            simulator.submit("Both of you, sit down."),
        )
        .await
        .expect("submit stalled on a full event channel")
        .unwrap();

        assert_eq!(outcome.student_turns.len(), 2);
        assert_eq!(simulator.session().transcript().len(), 5);
        assert_eq!(simulator.session().scores().scores(), &[90]);
        assert!(matches!(
            rx.try_recv(),
            Ok(SimulationEvent::TranscriptReset { .. })
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_events_follow_submission_order() {
        let mut mock = MockCompletionClient::new();
        expect_turn(&mut mock, "OVERALL SCORE: 55%", "[Alex]: \"No.\"");
        let (tx, mut rx) = mpsc::channel(16);
        let mut simulator = Simulator::new(Arc::new(mock), seeded_catalog())
            .unwrap()
            .with_reply_delay(Duration::ZERO)
            .with_events(tx);

        simulator.start_scenario(0).await.unwrap();
        simulator.submit("Alex, step outside.").await.unwrap();
        drop(simulator);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], SimulationEvent::TranscriptReset { scenario_title, .. } if scenario_title == "First"));
        assert!(matches!(&events[1], SimulationEvent::TeacherTurn(turn) if turn.text == "Alex, step outside."));
        assert!(matches!(
            &events[2],
            SimulationEvent::Feedback { tone: Some(FeedbackTone::Negative), .. }
        ));
        assert!(matches!(&events[3], SimulationEvent::StudentTurns(turns) if turns.len() == 1));
    }

    #[tokio::test]
    async fn test_restart_keeps_scores_and_reset_clears_them() {
        let mut mock = MockCompletionClient::new();
        expect_turn(&mut mock, "OVERALL SCORE: 80%", "[Jordan]: \"Ok.\"");
        let mut simulator = started(mock).await;
        simulator.submit("Jordan, come with me.").await.unwrap();

        simulator.start_scenario(0).await.unwrap();
        assert_eq!(simulator.session().transcript().len(), 2);
        assert_eq!(simulator.session().scores().scores(), &[80]);

        simulator.reset().await.unwrap();
        assert!(simulator.session().scores().is_empty());
        assert_eq!(simulator.current_scenario_index(), 0);
    }

    #[tokio::test]
    async fn test_next_scenario_wraps_around() {
        let mut simulator = started(MockCompletionClient::new()).await;
        simulator.next_scenario().await.unwrap();
        assert_eq!(simulator.current_scenario_index(), 1);
        assert_eq!(simulator.session().scenario().title, "Second");
        simulator.next_scenario().await.unwrap();
        assert_eq!(simulator.current_scenario_index(), 0);
    }

    #[tokio::test]
    async fn test_hint_uses_hint_kind() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .withf(|_, kind| *kind == CompletionKind::Hint)
            .times(1)
            .returning(|_, _| Ok("  Separate the students first.\n".to_string()));
        let simulator = started(mock).await;

        assert_eq!(simulator.hint().await.unwrap(), "Separate the students first.");
    }

    #[tokio::test]
    async fn test_summary_reflects_scores() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .withf(|_, kind| *kind == CompletionKind::Feedback)
            .times(2)
            .returning({
                let mut calls = 0;
                move |_, _| {
                    calls += 1;
                    Ok(if calls == 1 { "OVERALL SCORE: 90%" } else { "OVERALL SCORE: 70%" }.to_string())
                }
            });
        mock.expect_complete()
            .withf(|_, kind| *kind == CompletionKind::Student)
            .times(2)
            .returning(|_, _| Ok("[Jordan]: \"Ok.\"".to_string()));
        let mut simulator = started(mock).await;

        simulator.submit("First try.").await.unwrap();
        simulator.submit("Second try.").await.unwrap();

        let summary = simulator.summary();
        assert_eq!(summary.responses, 2);
        assert_relative_eq!(summary.average, 80.0);
        assert_eq!(summary.tier, PerformanceTier::VeryGood);
        assert_relative_eq!(summary.progress_percent, 20.0);
        assert!(simulator.session().scores().len() <= simulator.session().teacher_turns_submitted());
    }
}
