//! Classroom Scenarios
//!
//! A scenario is the fixed description a training session is seeded from.
//! Scenarios are loaded once, either from the built-in catalogue or from a
//! JSON file, and never change afterwards.

use crate::turn::Turn;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioCatalogError {
    #[error("Failed to read scenario file {0}: {1}")]
    Io(String, std::io::Error),
    #[error("Invalid scenario file {0}: {1}")]
    Json(String, serde_json::Error),
    #[error("Scenario source {0} contains no scenarios")]
    Empty(String),
}

/// A classroom-conflict description used to seed a training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: u32,
    pub title: String,
    pub description: String,
    /// Opening lines of the transcript. When empty, the opening dialogue is
    /// generated by the model at scenario start.
    #[serde(default)]
    pub seed_transcript: Vec<Turn>,
    pub context: String,
}

/// The ordered, non-empty set of scenarios available to a simulator.
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
}

impl ScenarioCatalog {
    /// The scenarios shipped with the simulator.
    pub fn builtin() -> Self {
        Self {
            scenarios: vec![history_class_fight()],
        }
    }

    /// Wraps an in-memory list; at least one scenario is required.
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, ScenarioCatalogError> {
        if scenarios.is_empty() {
            return Err(ScenarioCatalogError::Empty("<memory>".to_string()));
        }
        Ok(Self { scenarios })
    }

    /// Loads a JSON array of scenarios from disk.
    pub fn from_json_file(path: &Path) -> Result<Self, ScenarioCatalogError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScenarioCatalogError::Io(display.clone(), e))?;
        let scenarios: Vec<Scenario> =
            serde_json::from_str(&raw).map_err(|e| ScenarioCatalogError::Json(display.clone(), e))?;
        if scenarios.is_empty() {
            return Err(ScenarioCatalogError::Empty(display));
        }
        Self::new(scenarios)
    }

    pub fn get(&self, index: usize) -> Option<&Scenario> {
        self.scenarios.get(index)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }
}

/// The opening transcript used whenever the generated one is unusable.
///
/// Always four turns, starting with a system line.
pub fn fallback_transcript() -> Vec<Turn> {
    vec![
        Turn::system("You notice the classroom situation developing."),
        Turn::student(
            "Jordan",
            "You didn't even do your part. We had to cover for you.",
        ),
        Turn::student("Alex", "That's not true! At least I showed up\u{2014}unlike you."),
        Turn::system("The situation has escalated to physical violence."),
    ]
}

fn history_class_fight() -> Scenario {
    Scenario {
        id: 1,
        title: "History Class Fight".to_string(),
        description: "It is third period in a 10th-grade history class. You are midway through a lecture \
when two students, Alex and Jordan, begin arguing about their group project. Jordan (raising his voice): \
\"You didn't even do your part. We had to cover for you.\" Alex (snapping back): \"That's not true! At least \
I showed up\u{2014}unlike you.\" The tension escalates quickly. Jordan pushes his chair back and walks across \
the room. Alex stands, ready to confront him. Within seconds, Jordan shoves Alex, and Alex swings a fist in \
response. The room erupts\u{2014}students are shouting, some standing on chairs, a few pulling out their phones \
to record. Papers scatter, desks shift, and the atmosphere feels chaotic. You are at the front of the \
classroom. The fight is happening near the back, and your students are looking to you. What do you do next?"
            .to_string(),
        seed_transcript: Vec::new(),
        context: "A full physical altercation has erupted in your classroom during instruction. Students \
are recording, chaos has taken over, and immediate intervention is critical for safety."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::SpeakerRole;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog_has_generated_opening() {
        let catalog = ScenarioCatalog::builtin();
        assert_eq!(catalog.len(), 1);
        let scenario = catalog.get(0).unwrap();
        assert_eq!(scenario.title, "History Class Fight");
        assert!(scenario.seed_transcript.is_empty());
        assert!(scenario.description.contains("Alex and Jordan"));
        assert!(catalog.get(1).is_none());
    }

    #[test]
    fn test_fallback_transcript_shape() {
        let turns = fallback_transcript();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].speaker_role, SpeakerRole::System);
        assert_eq!(turns[1].speaker_name.as_deref(), Some("Jordan"));
        assert_eq!(turns[2].speaker_name.as_deref(), Some("Alex"));
        assert_eq!(turns[3].speaker_role, SpeakerRole::System);
    }

    #[test]
    fn test_load_catalog_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{
                "id": 7,
                "title": "Hallway Shove",
                "description": "Two students collide in the hallway.",
                "context": "Passing period.",
                "seed_transcript": [
                    {{"speaker_role": "system", "text": "The hallway is crowded."}},
                    {{"speaker_role": "student", "speaker_name": "Sam", "text": "Watch it!"}}
                ]
            }}]"#
        )
        .unwrap();

        let catalog = ScenarioCatalog::from_json_file(file.path()).unwrap();
        let scenario = catalog.get(0).unwrap();
        assert_eq!(scenario.id, 7);
        assert_eq!(scenario.seed_transcript.len(), 2);
        assert_eq!(scenario.seed_transcript[1], Turn::student("Sam", "Watch it!"));
    }

    #[test]
    fn test_empty_catalog_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        let err = ScenarioCatalog::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ScenarioCatalogError::Empty(_)));
    }

    #[test]
    fn test_missing_catalog_file_is_io_error() {
        let err = ScenarioCatalog::from_json_file(Path::new("/nonexistent/scenarios.json"))
            .unwrap_err();
        assert!(matches!(err, ScenarioCatalogError::Io(_, _)));
    }
}
