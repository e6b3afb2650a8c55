use serde::{Deserialize, Serialize};
use std::fmt;

/// Who spoke a line of the classroom transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerRole {
    /// Narration describing what is happening in the room.
    System,
    Student,
    Teacher,
}

impl fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeakerRole::System => write!(f, "system"),
            SpeakerRole::Student => write!(f, "student"),
            SpeakerRole::Teacher => write!(f, "teacher"),
        }
    }
}

/// A single attributed message in the conversation transcript.
///
/// Turns are never edited once appended; a transcript only grows or is
/// replaced wholesale when a scenario restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker_role: SpeakerRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_name: Option<String>,
    pub text: String,
}

impl Turn {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            speaker_role: SpeakerRole::System,
            speaker_name: None,
            text: text.into(),
        }
    }

    /// A student line attributed to a named student.
    pub fn student(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker_role: SpeakerRole::Student,
            speaker_name: Some(name.into()),
            text: text.into(),
        }
    }

    /// A student line the model did not attribute to anyone.
    pub fn unattributed_student(text: impl Into<String>) -> Self {
        Self {
            speaker_role: SpeakerRole::Student,
            speaker_name: None,
            text: text.into(),
        }
    }

    pub fn teacher(text: impl Into<String>) -> Self {
        Self {
            speaker_role: SpeakerRole::Teacher,
            speaker_name: None,
            text: text.into(),
        }
    }

    /// The name shown next to the turn: the student's name, "Teacher", or
    /// the role itself for narration and unattributed students.
    pub fn display_name(&self) -> String {
        match (self.speaker_role, &self.speaker_name) {
            (SpeakerRole::Teacher, _) => "Teacher".to_string(),
            (_, Some(name)) => name.clone(),
            (role, None) => role.to_string(),
        }
    }
}

/// Renders the turn the way it appears in prompt context: narration as-is,
/// spoken lines as `Name: "text"`.
impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.speaker_role, &self.speaker_name) {
            (SpeakerRole::System, _) => write!(f, "{}", self.text),
            (SpeakerRole::Teacher, _) => write!(f, "Teacher: \"{}\"", self.text),
            (SpeakerRole::Student, Some(name)) => write!(f, "{}: \"{}\"", name, self.text),
            (SpeakerRole::Student, None) => write!(f, "{}", self.text),
        }
    }
}
