//! Response Parser
//!
//! Turns unstructured completion text into structured session state. The
//! model is an unreliable source, so every path here degrades to a fallback
//! instead of failing: the functions in this module never return errors and
//! hold no state, so the same input always yields the same output.

use crate::{
    evaluation::{CriterionRating, Evaluation, SeverityMarker, Tier},
    scenario::fallback_transcript,
    turn::Turn,
};
use regex::Regex;
use std::sync::LazyLock;

static DIALOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^(system|student):\s*"?([^"]*)"?$"#).expect("invalid dialog line regex")
});

static SPEAKER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][A-Za-z .'-]{0,30}):\s*(.+)$").expect("invalid speaker prefix regex")
});

static BRACKETED_QUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([^\]]+)\]:\s*"([^"]+)""#).expect("invalid bracketed quote regex")
});

static NAMED_QUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b([A-Z][a-z]+):\s*"([^"]+)""#).expect("invalid named quote regex")
});

static SPEAKER_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+:\s").expect("invalid speaker boundary regex"));

static OVERALL_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)overall\s+score\s*[*_]*\s*:\s*[*_]*\s*(\d+)\s*%")
        .expect("invalid overall score regex")
});

static PLAIN_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)score\s*[*_]*\s*:\s*[*_]*\s*(\d+)").expect("invalid plain score regex")
});

static CRITERION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^\s*\d+\.\s*[*_]*\s*([^:*\n]+?)\s*[*_]*\s*:\s*[*_\[ \t]*(EXEMPLARY|MEETS\s+EXPECTATIONS|ROOM\s+FOR\s+IMPROVEMENT)",
    )
    .expect("invalid criterion regex")
});

static FEEDBACK_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bfeedback\s*[*_]*\s*:\s*[*_]*\s*(.+)").expect("invalid feedback regex")
});

static TIER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(EXEMPLARY|MEETS EXPECTATIONS|ROOM FOR IMPROVEMENT)\b")
        .expect("invalid tier label regex")
});

/// Strips one pair of matching quotes wrapping `text`.
fn unquote(text: &str) -> &str {
    let text = text.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('\u{201c}', '\u{201d}')] {
        if text.len() >= open.len_utf8() + close.len_utf8()
            && text.starts_with(open)
            && text.ends_with(close)
        {
            return text[open.len_utf8()..text.len() - close.len_utf8()].trim();
        }
    }
    text
}

/// Builds a student turn from `Name: text`, or an unattributed one.
fn student_turn(content: &str) -> Turn {
    match SPEAKER_PREFIX.captures(content) {
        Some(caps) => Turn::student(caps[1].trim(), unquote(&caps[2])),
        None => Turn::unattributed_student(content.trim()),
    }
}

// --- Initial dialog ---

/// Parses `role: "text"` lines into the opening transcript.
///
/// Lines that do not match are dropped. If nothing matches, the built-in
/// four-line transcript is returned, so the result is never empty.
pub fn parse_initial_dialog(text: &str) -> Vec<Turn> {
    let turns: Vec<Turn> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let caps = DIALOG_LINE.captures(line)?;
            let content = caps[2].trim();
            if content.is_empty() {
                return None;
            }
            if caps[1].eq_ignore_ascii_case("system") {
                Some(Turn::system(content))
            } else {
                Some(student_turn(content))
            }
        })
        .collect();

    if turns.is_empty() {
        fallback_transcript()
    } else {
        turns
    }
}

// --- Student reply ---

/// One rung of the student-reply ladder.
#[derive(Clone, Copy)]
pub struct StudentReplyMatcher {
    pub name: &'static str,
    pub parse: fn(&str) -> Option<Vec<Turn>>,
}

/// The order matters: the first matcher that recognizes the text wins.
pub const STUDENT_REPLY_LADDER: [StudentReplyMatcher; 4] = [
    StudentReplyMatcher {
        name: "bracketed_quotes",
        parse: bracketed_quotes,
    },
    StudentReplyMatcher {
        name: "named_quotes",
        parse: named_quotes,
    },
    StudentReplyMatcher {
        name: "unquoted_speakers",
        parse: unquoted_speakers,
    },
    StudentReplyMatcher {
        name: "whole_text",
        parse: whole_text,
    },
];

fn quoted_turns(pattern: &Regex, text: &str) -> Option<Vec<Turn>> {
    let turns: Vec<Turn> = pattern
        .captures_iter(text)
        .map(|caps| Turn::student(caps[1].trim(), caps[2].trim()))
        .collect();
    (!turns.is_empty()).then_some(turns)
}

/// `[Name]: "quote"`, any number of times.
fn bracketed_quotes(text: &str) -> Option<Vec<Turn>> {
    quoted_turns(&BRACKETED_QUOTE, text)
}

/// `Name: "quote"` with a single capitalized word as the name.
fn named_quotes(text: &str) -> Option<Vec<Turn>> {
    quoted_turns(&NAMED_QUOTE, text)
}

/// Unquoted `Name: text Other: text`, split where each speaker starts.
/// Only applies when at least two speakers are found.
fn unquoted_speakers(text: &str) -> Option<Vec<Turn>> {
    let mut cuts: Vec<usize> = SPEAKER_BOUNDARY
        .find_iter(text)
        .map(|m| m.start())
        .filter(|&start| start > 0)
        .collect();
    cuts.push(text.len());

    let mut segments = Vec::with_capacity(cuts.len());
    let mut from = 0;
    for to in cuts {
        segments.push(&text[from..to]);
        from = to;
    }
    if segments.len() > 1 && segments[0].trim().is_empty() {
        segments.remove(0);
    }
    if segments.len() < 2 {
        return None;
    }

    let turns: Vec<Turn> = segments
        .into_iter()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(student_turn)
        .collect();
    (!turns.is_empty()).then_some(turns)
}

/// The whole completion as one unattributed student line.
fn whole_text(text: &str) -> Option<Vec<Turn>> {
    let text = text.trim();
    (!text.is_empty()).then(|| vec![Turn::unattributed_student(text)])
}

/// Splits a student-reply completion into attributed student turns.
///
/// Returns an empty list only when the completion is blank.
pub fn parse_student_reply(text: &str) -> Vec<Turn> {
    STUDENT_REPLY_LADDER
        .iter()
        .find_map(|matcher| (matcher.parse)(text))
        .unwrap_or_default()
}

// --- Evaluation ---

/// Extracts the overall percentage score, if the text carries one.
///
/// An explicit `OVERALL SCORE: N%` wins over a bare `SCORE: N`. Values
/// above 100 are not on the percentage scale and are discarded.
pub fn extract_score(text: &str) -> Option<u32> {
    let caps = OVERALL_SCORE
        .captures(text)
        .or_else(|| PLAIN_SCORE.captures(text))?;
    caps[1].parse::<u32>().ok().filter(|score| *score <= 100)
}

fn extract_criteria(text: &str) -> Vec<CriterionRating> {
    CRITERION_LINE
        .captures_iter(text)
        .filter_map(|caps| {
            let tier = Tier::from_label(&caps[2])?;
            Some(CriterionRating {
                name: caps[1].trim().to_string(),
                tier,
            })
        })
        .collect()
}

fn extract_comment(text: &str) -> String {
    FEEDBACK_COMMENT
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|comment| !comment.is_empty())
        .unwrap_or_else(|| text.trim().to_string())
}

/// Reads criteria ratings, the overall score and the comment out of a
/// feedback completion. Any part the model left out is simply absent.
pub fn parse_evaluation(text: &str) -> Evaluation {
    Evaluation {
        criteria: extract_criteria(text),
        overall_score: extract_score(text),
        comment: extract_comment(text),
    }
}

/// Finds every tier label in `text`, for display highlighting.
pub fn severity_markers(text: &str) -> Vec<SeverityMarker> {
    TIER_LABEL
        .find_iter(text)
        .filter_map(|m| {
            let tier = Tier::from_label(m.as_str())?;
            Some(SeverityMarker {
                tier,
                severity: tier.severity(),
                span: m.range(),
            })
        })
        .collect()
}

/// True if the turn list came from the built-in fallback.
pub fn is_fallback_transcript(turns: &[Turn]) -> bool {
    turns == fallback_transcript().as_slice()
}
