//! Plan detection and plan-feedback extraction over transcripts.

use crate::classify::{Classifier, FeedbackKind, PlanPatterns};
use crate::schema::MemoryTool;
use hook_common::transcript::{assistant_messages, tool_use_name, user_text};
use serde_json::Value;

/// Where a planner Task ran in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanContext {
    pub subagent_type: String,
    pub index: usize,
}

/// User reaction to a plan, with what is needed to record it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanFeedback {
    pub kind: FeedbackKind,
    /// The user message that carried the feedback
    pub reason: String,
    /// First user message before the plan
    pub topic: String,
}

impl PlanFeedback {
    /// Approved plans need no lesson.
    pub fn is_actionable(&self) -> bool {
        !matches!(self.kind, FeedbackKind::Approved)
    }
}

/// First Task call to a planner subagent.
pub fn detect_plan_context(entries: &[Value]) -> Option<PlanContext> {
    entries.iter().enumerate().find_map(|(index, entry)| {
        if tool_use_name(entry) != Some("Task") {
            return None;
        }
        let subagent_type = entry
            .get("input")
            .and_then(|input| input.get("subagent_type"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        (subagent_type.contains("planner") || subagent_type.contains("Plan")).then(|| PlanContext {
            subagent_type: subagent_type.to_string(),
            index,
        })
    })
}

/// Classify user messages after the plan; the first one with a verdict wins.
pub fn extract_plan_feedback<C>(
    entries: &[Value],
    context: &PlanContext,
    classifier: &C,
) -> Option<PlanFeedback>
where
    C: Classifier<Verdict = Option<FeedbackKind>>,
{
    let after = entries.get(context.index + 1..)?;
    after.iter().filter_map(user_text).find_map(|text| {
        classifier.classify(text).map(|kind| PlanFeedback {
            kind,
            reason: text.to_string(),
            topic: plan_topic(entries, context),
        })
    })
}

fn plan_topic(entries: &[Value], context: &PlanContext) -> String {
    entries[..context.index]
        .iter()
        .find_map(user_text)
        .map(|text| {
            text.chars()
                .take(100)
                .collect::<String>()
                .replace('\n', " ")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "Unknown topic".to_string())
}

/// Escape for a double-quoted tool argument.
fn escape_argument(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Instruction asking the agent to store the feedback as a lesson.
pub fn build_capture_instruction(feedback: &PlanFeedback) -> String {
    let rejected = matches!(feedback.kind, FeedbackKind::Rejected);
    let (outcome_text, outcome, guidance) = if rejected {
        (
            "Plan was REJECTED",
            "negative",
            "Avoid this approach when planning similar features",
        )
    } else {
        (
            "Plan was MODIFIED (constructive feedback)",
            "positive",
            "Apply this modification pattern for similar planning tasks",
        )
    };

    let modification = match &feedback.kind {
        FeedbackKind::Modified(fragment) => format!("Modification: {}", fragment),
        _ => String::new(),
    };

    let body = format!(
        "Plan for '{}' - {}\n\nFeedback: {}\n{}\n\nOutcome: {}\nGuidance: {}",
        feedback.topic, outcome_text, feedback.reason, modification, outcome, guidance
    );
    let topic: String = feedback.topic.chars().take(50).collect();
    let name = format!("Plan Lesson: {}", topic);

    format!(
        "🟠 ACTION REQUIRED: Capture plan feedback as lesson.\n\n\
         {}. Use this exact command:\n\n\
         {}(\n  name=\"{}\",\n  episode_body=\"{}\",\n  source=\"text\",\n  source_description=\"Human plan review feedback\"\n)\n\n\
         Or describe the lesson in your own words and I'll capture it.",
        outcome_text,
        MemoryTool::AddMemory.tool_name(),
        escape_argument(&name),
        escape_argument(&body),
    )
}

/// The assistant message that looks most like a plan, with a short summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanExtract {
    pub full_text: String,
    pub summary: String,
}

/// Pick the assistant message matching the most plan patterns.
pub fn extract_plan(entries: &[Value], patterns: &PlanPatterns) -> Option<PlanExtract> {
    let mut best: Option<(usize, String)> = None;
    for message in assistant_messages(entries) {
        let count = patterns.classify(&message);
        if count > best.as_ref().map_or(0, |(c, _)| *c) {
            best = Some((count, message));
        }
    }

    let (_, full_text) = best?;
    let summary: String = full_text
        .lines()
        .filter(|line| line.trim().chars().count() > 10)
        .take(5)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(500)
        .collect();

    Some(PlanExtract { full_text, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::FeedbackPatterns;
    use serde_json::json;

    fn transcript(reply: &str) -> Vec<Value> {
        vec![
            json!({"type": "user_message", "content": "Plan the cache eviction rework"}),
            json!({"type": "tool_use", "name": "Task", "input": {"subagent_type": "oh-my:planner"}}),
            json!({"type": "user_message", "content": [{"type": "text", "text": reply}]}),
        ]
    }

    #[test]
    fn test_detect_plan_context() {
        let entries = transcript("ok");
        assert_eq!(
            detect_plan_context(&entries),
            Some(PlanContext {
                subagent_type: "oh-my:planner".to_string(),
                index: 1
            })
        );

        let none = vec![json!({"type": "tool_use", "name": "Task", "input": {"subagent_type": "executor"}})];
        assert_eq!(detect_plan_context(&none), None);
    }

    #[test]
    fn test_rejection_feedback() {
        let entries = transcript("No, that's wrong. Start over.");
        let context = detect_plan_context(&entries).unwrap();
        let feedback = extract_plan_feedback(&entries, &context, &FeedbackPatterns).unwrap();

        assert_eq!(feedback.kind, FeedbackKind::Rejected);
        assert_eq!(feedback.topic, "Plan the cache eviction rework");
        assert!(feedback.is_actionable());
    }

    #[test]
    fn test_approval_is_not_actionable() {
        let entries = transcript("Looks good, proceed");
        let context = detect_plan_context(&entries).unwrap();
        let feedback = extract_plan_feedback(&entries, &context, &FeedbackPatterns).unwrap();
        assert!(!feedback.is_actionable());
    }

    #[test]
    fn test_no_feedback_after_plan() {
        let entries = transcript("what is the weather");
        let context = detect_plan_context(&entries).unwrap();
        assert_eq!(extract_plan_feedback(&entries, &context, &FeedbackPatterns), None);
    }

    #[test]
    fn test_build_capture_instruction_escapes() {
        let feedback = PlanFeedback {
            kind: FeedbackKind::Modified("change redis to sqlite".to_string()),
            reason: "Good, but \"change redis to sqlite\"".to_string(),
            topic: "Cache rework".to_string(),
        };
        let instruction = build_capture_instruction(&feedback);

        assert!(instruction.starts_with("🟠 ACTION REQUIRED"));
        assert!(instruction.contains("Plan was MODIFIED"));
        assert!(instruction.contains("mcp__gutt-mcp-remote__add_memory("));
        assert!(instruction.contains("name=\"Plan Lesson: Cache rework\""));
        assert!(instruction.contains("Good, but \\\"change redis to sqlite\\\""));
        assert!(instruction.contains("Modification: change redis to sqlite\\n"));
    }

    #[test]
    fn test_extract_plan_picks_best_message() {
        let entries = vec![
            json!({"role": "assistant", "content": "Let me look at the repository layout before planning anything."}),
            json!({"message": {"role": "assistant", "content": "## Implementation Plan\n1. Create the eviction module\n2. Add tests for step 2\nshort"}}),
        ];
        let plan = extract_plan(&entries, &PlanPatterns).unwrap();

        assert!(plan.full_text.starts_with("## Implementation Plan"));
        assert_eq!(
            plan.summary,
            "## Implementation Plan 1. Create the eviction module 2. Add tests for step 2"
        );
    }

    #[test]
    fn test_extract_plan_none_without_patterns() {
        let entries = vec![json!({"role": "assistant", "content": "Nothing plan shaped here, just a fairly long reply text."})];
        assert_eq!(extract_plan(&entries, &PlanPatterns), None);
    }
}
