//! Prompt Builder
//!
//! Pure functions that turn a scenario, the transcript so far and the latest
//! teacher response into the natural-language prompt for each request kind.
//! Nothing here checks what the model sends back; that is the parser's job.

use crate::{scenario::Scenario, turn::Turn};

/// The five rubric criteria, in the order the evaluation lists them.
pub const RUBRIC_CRITERIA: [&str; 5] = [
    "Safety & Crisis Protocols",
    "De-escalation & Communication",
    "Classroom Management & Bystanders",
    "Adherence to Policy & Ethical Standards",
    "Professionalism & Emotional Regulation",
];

const DIALOG_TEMPLATE: &str = r#"Based on this classroom violence scenario, generate initial dialog for a teacher training simulation featuring 10th-grade students (15-16 years old).

SCENARIO: {description}

Generate 3-5 initial messages showing the conflict progression. Use authentic Gen-Z language that's school-appropriate but reflects how teenagers actually speak:

STUDENT LANGUAGE GUIDELINES:
- Use casual contractions ("That's so..." "You're not gonna..." "I'm literally...")
- Include mild expressions ("This is ridiculous" "Whatever" "Seriously?" "No cap")
- Age-appropriate slang ("That's actually crazy" "For real?" "That's cap" "I'm done")
- Natural speech patterns teens use when stressed or frustrated
- Keep it realistic but school-appropriate

Include:
1. A system message describing when you notice the situation
2. 2-3 student dialog exchanges showing the escalation with authentic teen language
3. A final system message describing the current chaotic state

Format each message as: TYPE: "content"
Where TYPE is either "system" or "student"

Example format:
system: "You are midway through your history lecture when you notice tension building."
student: "Jordan: 'Bro, you literally didn't do anything for our project. That's so unfair.'"
student: "Alex: 'That's cap! I showed up way more than you did, for real.'"
system: "The physical fight has erupted and chaos fills the classroom."

Generate realistic dialog with authentic 10th-grade language:"#;

const FEEDBACK_TEMPLATE: &str = r#"You are an expert in classroom crisis management evaluating a teacher's response to classroom violence. Rate the teacher's response against these 5 specific criteria:

SCENARIO: {title}
DESCRIPTION: {description}
CONTEXT: {context}

DIALOG SO FAR:
{dialog}

TEACHER'S LATEST RESPONSE: "{response}"

Evaluate the teacher's response using these exact criteria:

**1. Safety & Crisis Protocols**
- EXEMPLARY: Prioritizes safety, clear directions, calls for help immediately
- MEETS EXPECTATIONS: Addresses safety but less decisive
- ROOM FOR IMPROVEMENT: Ignores protocols or handles alone

**2. De-escalation & Communication**
- EXEMPLARY: Uses calm, empathetic language that validates emotions
- MEETS EXPECTATIONS: Basic calm communication
- ROOM FOR IMPROVEMENT: Harsh, dismissive, or confrontational language

**3. Classroom Management & Bystanders**
- EXEMPLARY: Clear directions to other students to stay seated/quiet
- MEETS EXPECTATIONS: Some attempt to manage the class
- ROOM FOR IMPROVEMENT: No management of bystanders

**4. Adherence to Policy & Ethical Standards**
- EXEMPLARY: Follows proper documentation and administrative protocols
- MEETS EXPECTATIONS: Mentions involving administration
- ROOM FOR IMPROVEMENT: Threatens inappropriate consequences

**5. Professionalism & Emotional Regulation**
- EXEMPLARY: Maintains calm, steady, professional demeanor
- MEETS EXPECTATIONS: Controlled but may show some stress
- ROOM FOR IMPROVEMENT: Loses composure, sarcastic, or unprofessional

Format your response exactly like this:

**CRITERIA EVALUATION:**

{criteria}

**OVERALL SCORE:** [percentage]%

**FEEDBACK:** [2-3 sentences of specific, actionable feedback]

For scoring, assign points to each criterion:
- EXEMPLARY = 20 points
- MEETS EXPECTATIONS = 15 points
- ROOM FOR IMPROVEMENT = 10 points

Sum all 5 criteria scores for the overall percentage (out of 100%)."#;

const STUDENT_TEMPLATE: &str = r#"You are role-playing as 10th-grade students (15-16 years old) in this classroom violence scenario. Use authentic Gen-Z language that's appropriate for school but reflects how teenagers actually speak today.

SCENARIO: {title}
DESCRIPTION: {description}

DIALOG SO FAR:
{dialog}

The teacher just said: "{response}"

Generate realistic responses from the students involved. Use natural 10th-grade language including:
- Casual contractions ("That's so..." "I'm not gonna..." "He's being...")
- Mild expressions of frustration ("This is ridiculous" "Whatever" "Seriously?")
- Age-appropriate slang ("That's cap" "No way" "For real?" "That's actually crazy")
- Natural speech patterns teens use when stressed or emotional

Consider:
- Are they calming down or still agitated?
- How would they realistically react to this teacher approach?
- Keep it school-appropriate but authentic to how 15-16 year olds actually talk
- 1-2 sentences from the main students involved

Response format: [Student name]: "[response]""#;

const HINT_TEMPLATE: &str = r#"Give a brief hint for this classroom violence situation:

SCENARIO: {title}
DESCRIPTION: {description}

Provide ONE specific, actionable tip in 1-2 sentences. Be concise and focus on immediate de-escalation."#;

/// Substitutes `{name}` placeholders in a single pass over `template`.
///
/// Substituted values are never scanned again, so braces inside scenario
/// text or a teacher response come through verbatim. Unknown placeholders
/// are left as they are.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let value = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Joins turns into the `DIALOG SO FAR` block, one line per turn.
pub fn dialog_context(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Asks for 3-5 alternating system/student lines depicting the escalation.
pub fn dialog(scenario: &Scenario) -> String {
    fill(DIALOG_TEMPLATE, &[("description", scenario.description.as_str())])
}

/// Asks for the five-criterion rubric evaluation of `teacher_response`.
///
/// `transcript` is the full transcript, including the teacher turn that was
/// just appended.
pub fn feedback(scenario: &Scenario, transcript: &[Turn], teacher_response: &str) -> String {
    let criteria = RUBRIC_CRITERIA
        .iter()
        .enumerate()
        .map(|(i, name)| {
            format!(
                "{}. **{}:** [EXEMPLARY/MEETS EXPECTATIONS/ROOM FOR IMPROVEMENT]",
                i + 1,
                name
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    fill(
        FEEDBACK_TEMPLATE,
        &[
            ("title", scenario.title.as_str()),
            ("description", scenario.description.as_str()),
            ("context", scenario.context.as_str()),
            ("criteria", criteria.as_str()),
            ("dialog", dialog_context(transcript).as_str()),
            ("response", teacher_response),
        ],
    )
}

/// Asks for 1-2 in-character student replies to `teacher_response`.
///
/// The last transcript entry (the teacher turn being answered) is left out
/// of the dialog context; the response is quoted separately instead.
pub fn student(scenario: &Scenario, transcript: &[Turn], teacher_response: &str) -> String {
    let prior = match transcript.split_last() {
        Some((_, rest)) => rest,
        None => transcript,
    };

    fill(
        STUDENT_TEMPLATE,
        &[
            ("title", scenario.title.as_str()),
            ("description", scenario.description.as_str()),
            ("dialog", dialog_context(prior).as_str()),
            ("response", teacher_response),
        ],
    )
}

/// Asks for one short, actionable de-escalation tip.
pub fn hint(scenario: &Scenario) -> String {
    fill(
        HINT_TEMPLATE,
        &[("title", scenario.title.as_str()), ("description", scenario.description.as_str())],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioCatalog;

    fn scenario() -> Scenario {
        ScenarioCatalog::builtin().get(0).unwrap().clone()
    }

    #[test]
    fn test_dialog_prompt_embeds_description() {
        let scenario = scenario();
        let prompt = dialog(&scenario);
        assert!(prompt.contains(scenario.description.as_str()));
        assert!(prompt.contains("TYPE: \"content\""));
        assert!(!prompt.contains("{description}"));
    }

    #[test]
    fn test_feedback_prompt_lists_every_criterion_and_full_dialog() {
        let scenario = scenario();
        let transcript = vec![
            Turn::system("Chaos in the back row."),
            Turn::teacher("Everyone stay seated."),
        ];
        let prompt = feedback(&scenario, &transcript, "Everyone stay seated.");

        for (i, name) in RUBRIC_CRITERIA.iter().enumerate() {
            assert!(prompt.contains(&format!("{}. **{}:**", i + 1, name)));
        }
        assert!(prompt.contains("Chaos in the back row.\nTeacher: \"Everyone stay seated.\""));
        assert!(prompt.contains("TEACHER'S LATEST RESPONSE: \"Everyone stay seated.\""));
        assert!(prompt.contains(&format!("CONTEXT: {}", scenario.context)));
        assert!(prompt.contains("**OVERALL SCORE:** [percentage]%"));
    }

    #[test]
    fn test_student_prompt_excludes_latest_turn_from_context() {
        let scenario = scenario();
        let transcript = vec![
            Turn::student("Jordan", "You're so annoying."),
            Turn::teacher("Jordan, step outside please."),
        ];
        let prompt = student(&scenario, &transcript, "Jordan, step outside please.");

        assert!(prompt.contains("DIALOG SO FAR:\nJordan: \"You're so annoying.\"\n"));
        assert!(!prompt.contains("Teacher: \"Jordan, step outside please.\""));
        assert!(prompt.contains("The teacher just said: \"Jordan, step outside please.\""));
    }

    #[test]
    fn test_student_prompt_with_empty_transcript() {
        let prompt = student(&scenario(), &[], "Stop!");
        assert!(prompt.contains("DIALOG SO FAR:\n\n"));
    }

    #[test]
    fn test_fill_is_single_pass() {
        assert_eq!(
            fill("{a} and {b}", &[("a", "{b}"), ("b", "x")]),
            "{b} and x"
        );
        assert_eq!(fill("{ {unknown} }", &[("a", "x")]), "{ {unknown} }");
    }

    #[test]
    fn test_braces_in_user_text_are_not_expanded() {
        let mut scenario = scenario();
        scenario.description = "Two students argue about {context}.".to_string();
        let transcript = vec![Turn::teacher("Type {dialog} or {response} here.")];
        let prompt = feedback(&scenario, &transcript, "Type {dialog} or {response} here.");

        assert!(prompt.contains("DESCRIPTION: Two students argue about {context}."));
        assert!(prompt.contains("TEACHER'S LATEST RESPONSE: \"Type {dialog} or {response} here.\""));
        assert_eq!(prompt.matches("Type {dialog} or {response} here.").count(), 2);

        let prompt = student(&scenario, &transcript, "Type {dialog} or {response} here.");
        assert!(prompt.contains("The teacher just said: \"Type {dialog} or {response} here.\""));
        assert!(prompt.contains("DIALOG SO FAR:\n\n"));
    }

    #[test]
    fn test_hint_prompt() {
        let scenario = scenario();
        let prompt = hint(&scenario);
        assert!(prompt.contains("SCENARIO: History Class Fight"));
        assert!(prompt.contains("ONE specific, actionable tip"));
    }

    #[test]
    fn test_builders_are_pure() {
        let scenario = scenario();
        let transcript = vec![Turn::teacher("Calm down.")];
        assert_eq!(
            feedback(&scenario, &transcript, "Calm down."),
            feedback(&scenario, &transcript, "Calm down.")
        );
    }
}
