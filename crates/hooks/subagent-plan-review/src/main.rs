//! SubagentStop hook: review plans against organizational memory.
//!
//! Reads the finished subagent's transcript and picks its most plan-like
//! message. If that is a plan, the agent is asked to look for related
//! lessons before implementing it. CLI blocks the stop; Cowork cannot
//! block, so the same text goes in as context.

use hook_common::prelude::*;
use hook_common::text::{sanitize_for_display, truncate_chars};
use hook_common::transcript::read_entries;
use hook_memory::plan_feedback::extract_plan;
use hook_memory::terms::tech_terms;
use hook_memory::PlanPatterns;
use std::process::ExitCode;

fn main() -> ExitCode {
    run_hook("subagent-plan-review", handle)
}

fn handle(ctx: &HookContext) -> Result<HookResponse> {
    let Some(path) = ctx.input.agent_transcript_path.as_deref() else {
        return Ok(HookResponse::Silent);
    };

    let entries = read_entries(path, ctx.env.home_dir.as_deref());
    let patterns = PlanPatterns;
    let Some(plan) = extract_plan(&entries, &patterns) else {
        return Ok(HookResponse::Silent);
    };
    if !patterns.is_plan_like(&plan.full_text) {
        return Ok(HookResponse::Silent);
    }

    let reason = review_reason(&plan.summary);
    let output = HookOutput::for_platform(ctx.platform, reason.clone(), reason)
        .with_event(HookEvent::SubagentStop);

    let decision = if output.is_block() { "block" } else { "context" };
    ctx.log_decision(
        ctx.input.session_id().unwrap_or_default(),
        decision,
        "plan detected in subagent output",
    );
    Ok(output.into())
}

fn review_reason(summary: &str) -> String {
    let query = sanitize_for_display(&tech_terms(summary));
    let mut shown = sanitize_for_display(&truncate_chars(summary, 200));
    if summary.chars().count() > 200 {
        shown.push_str("...");
    }

    format!(
        "[GUTT Plan Review]\n\n\
         A plan has been created. Before proceeding with implementation:\n\n\
         **Search organizational memory for:**\n\
         - Similar past implementations\n\
         - Lessons learned from related work\n\
         - Potential pitfalls to avoid\n\n\
         Delegate to memory-keeper agent:\n\n\
         Task(subagent_type=\"memory-keeper\", model=\"haiku\", prompt=\"Search for lessons and context about: {}\")\n\n\
         Plan summary: \"{}\"",
        query, shown
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use serde_json::json;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const PLAN: &str = "## Implementation Plan\n\
        1. Create the webhook retry queue\n\
        2. Add the endpoint for replaying failed deliveries\n\
        Phase 2 covers the dashboard.";

    fn context(platform: Platform, assistant_text: &str) -> (TempDir, HookContext) {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let transcript = root.join("agent.jsonl");
        let lines = [
            json!({"type": "user_message", "content": "plan the retry work"}),
            json!({"message": {"role": "assistant", "content": [{"type": "text", "text": assistant_text}]}}),
        ];
        let body: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        fs::write(&transcript, body.join("\n")).unwrap();

        let raw = json!({"hook_event_name": "SubagentStop", "agent_transcript_path": transcript.as_str()});
        let input = HookInput::parse(&raw.to_string()).unwrap();
        let ctx = HookContext::new("subagent-plan-review", input, HookEnv::for_project(root))
            .with_platform(platform);
        (dir, ctx)
    }

    #[test]
    fn test_cli_blocks_on_plan() {
        let (_dir, ctx) = context(Platform::Cli, PLAN);

        let HookResponse::Output(output) = handle(&ctx).unwrap() else {
            panic!("expected directive");
        };
        assert!(output.is_block());
        assert!(output.text().starts_with("[GUTT Plan Review]"));
        assert!(output.text().contains("Search for lessons and context about: implementation create add endpoint"));
        assert!(output.text().contains("Plan summary: \"## Implementation Plan 1. Create"));
    }

    #[test]
    fn test_cowork_injects_context() {
        let (_dir, ctx) = context(Platform::Cowork, PLAN);

        let HookResponse::Output(output) = handle(&ctx).unwrap() else {
            panic!("expected directive");
        };
        assert!(!output.is_block());
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["hookSpecificOutput"]["hookEventName"], "SubagentStop");
    }

    #[test]
    fn test_non_plan_output_is_silent() {
        let (_dir, ctx) = context(
            Platform::Cli,
            "I looked at the logs and the queue consumer restarted twice overnight.",
        );
        assert_eq!(handle(&ctx).unwrap(), HookResponse::Silent);
    }

    #[test]
    fn test_missing_transcript_is_silent() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let input =
            HookInput::parse(r#"{"agent_transcript_path": "/nonexistent/agent.jsonl"}"#).unwrap();
        let ctx = HookContext::new("subagent-plan-review", input, HookEnv::for_project(root));
        assert_eq!(handle(&ctx).unwrap(), HookResponse::Silent);
    }

    #[test]
    fn test_long_summary_is_cut() {
        let summary = "step ".repeat(60);
        assert!(review_reason(&summary).ends_with("...\""));
        assert!(!review_reason("short plan").ends_with("...\""));
    }
}
