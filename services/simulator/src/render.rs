//! Terminal rendering for transcript turns, feedback and progress.

use colored::*;
use safeclass_core::{
    evaluation::{Evaluation, Severity},
    parser::severity_markers,
    scoring::{FeedbackTone, PerformanceTier},
    simulator::TrainingSummary,
    turn::{SpeakerRole, Turn},
};

const PROGRESS_WIDTH: usize = 20;

pub fn turn(turn: &Turn) -> String {
    match turn.speaker_role {
        SpeakerRole::System => format!("  {}", turn.text.dimmed().italic()),
        SpeakerRole::Teacher => format!("  {}", turn.to_string().bright_blue().bold()),
        SpeakerRole::Student => match &turn.speaker_name {
            Some(name) => format!("  {} \"{}\"", format!("{}:", name).yellow().bold(), turn.text),
            None => format!("  {}", turn.text.yellow()),
        },
    }
}

pub fn transcript(title: &str, turns: &[Turn]) -> String {
    let mut out = format!("\n{}\n", format!("=== {} ===", title).bright_cyan().bold());
    for t in turns {
        out.push_str(&turn(t));
        out.push('\n');
    }
    out
}

fn paint(label: &str, severity: Severity) -> ColoredString {
    match severity {
        Severity::Green => label.green().bold(),
        Severity::Yellow => label.yellow().bold(),
        Severity::Red => label.red().bold(),
    }
}

/// Colours every tier label in `text` by its severity.
pub fn highlight_tiers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut from = 0;
    for marker in severity_markers(text) {
        out.push_str(&text[from..marker.span.start]);
        out.push_str(&paint(&text[marker.span.clone()], marker.severity).to_string());
        from = marker.span.end;
    }
    out.push_str(&text[from..]);
    out
}

pub fn feedback(text: &str, evaluation: &Evaluation, tone: Option<FeedbackTone>) -> String {
    let header = match (evaluation.overall_score, tone) {
        (Some(score), Some(FeedbackTone::Positive)) => format!("Feedback ({}%)", score).green(),
        (Some(score), Some(FeedbackTone::Neutral)) => format!("Feedback ({}%)", score).yellow(),
        (Some(score), _) => format!("Feedback ({}%)", score).red(),
        (None, _) => "Feedback".normal(),
    };

    let mut out = format!("\n{}\n", header.bold());
    if !evaluation.criteria.is_empty() {
        for rating in &evaluation.criteria {
            out.push_str(&format!(
                "  {:<40} {} ({} pts)\n",
                rating.name,
                paint(rating.tier.label(), rating.tier.severity()),
                rating.tier.points()
            ));
        }
        out.push('\n');
    }
    out.push_str(&highlight_tiers(text.trim()));
    out.push('\n');
    out
}

pub fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * PROGRESS_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:.0}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled),
        percent
    )
}

pub fn summary(summary: &TrainingSummary) -> String {
    let tier = summary.tier.to_string();
    let tier = match summary.tier {
        PerformanceTier::Excellent | PerformanceTier::VeryGood => tier.green(),
        PerformanceTier::Good | PerformanceTier::Satisfactory => tier.yellow(),
        PerformanceTier::NeedsImprovement => tier.red(),
    };
    format!(
        "\n{}\n  Responses: {}\n  Average:   {:.1}%\n  Level:     {}\n  Progress:  {}\n",
        "Training summary".bright_cyan().bold(),
        summary.responses,
        summary.average,
        tier.bold(),
        progress_bar(summary.progress_percent)
    )
}
