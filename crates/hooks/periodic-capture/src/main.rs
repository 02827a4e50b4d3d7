//! PostToolUse hook: periodic lesson capture on Cowork.
//!
//! Cowork cannot block a stop, so lessons are collected while the session
//! runs instead. Each Edit, Write or Task call counts as a significant
//! operation; when [`CapturePolicy`] says enough work has happened, the
//! agent is told to delegate capture to the memory-keeper agent.

use chrono::Utc;
use hook_common::prelude::*;
use hook_memory::{CapturePolicy, SessionState, SessionStore};
use std::process::ExitCode;

const MEMORY_AGENTS: &[&str] = &[
    "memory-keeper",
    "gutt-pro-memory",
    "config-discovery",
    "memory-capture",
    "memory",
];

fn main() -> ExitCode {
    run_hook("periodic-capture", handle)
}

fn handle(ctx: &HookContext) -> Result<HookResponse> {
    if !ctx.platform.is_cowork() || !ctx.memory_service_registered() {
        return Ok(HookResponse::Silent);
    }
    if !is_significant(&ctx.input) {
        return Ok(HookResponse::Silent);
    }

    let sessions = SessionStore::new(ctx.state.clone());
    let state = sessions.increment_significant_ops()?;

    let now = Utc::now();
    let policy = CapturePolicy::default();
    if !policy.should_capture(
        state.significant_ops,
        state.lessons_captured,
        state.last_capture_prompt_at,
        now,
    ) {
        return Ok(HookResponse::Silent);
    }

    sessions.record_capture_prompt()?;
    ctx.log_decision(
        ctx.input.session_id().unwrap_or(&state.session_id),
        "context",
        "periodic capture threshold reached",
    );

    Ok(HookOutput::context(capture_context(&state, state.duration_minutes(now)))
        .with_event(HookEvent::PostToolUse)
        .into())
}

fn is_significant(input: &HookInput) -> bool {
    if input.is_edit() || input.is_write() {
        return true;
    }
    if !input.is_task() {
        return false;
    }
    let subagent_type = input.subagent_type().unwrap_or_default().to_lowercase();
    !MEMORY_AGENTS.iter().any(|agent| subagent_type.contains(agent))
}

fn capture_context(state: &SessionState, duration_minutes: i64) -> String {
    format!(
        "[GUTT Periodic Capture - Cowork]\n\n\
         Significant work detected ({ops} operations, {mins}min session, {queries} memory queries, {lessons} lessons captured so far).\n\n\
         You MUST delegate to memory-keeper agent to capture current session lessons:\n\n\
         Task(subagent_type=\"memory-keeper\", model=\"haiku\", prompt=\"Capture lessons from the current Cowork session. \
         Session duration: {mins} minutes. Operations: {ops}. Memory queries: {queries}. Previous lessons captured: {lessons}. \
         Review the recent conversation for decisions, corrections, discoveries, and patterns worth preserving.\")\n\n\
         Do not skip, do not ask the user.",
        ops = state.significant_ops,
        mins = duration_minutes,
        queries = state.memory_queries,
        lessons = state.lessons_captured,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use chrono::Duration;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn context(raw: &str, platform: Platform) -> (TempDir, HookContext) {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(root.join(".mcp.json"), r#"{"gutt-mcp-remote": {}}"#).unwrap();
        let input = HookInput::parse(raw).unwrap();
        let ctx = HookContext::new("periodic-capture", input, HookEnv::for_project(root))
            .with_state(StateManager::in_memory())
            .with_platform(platform);
        (dir, ctx)
    }

    const EDIT: &str = r#"{"tool_name": "Edit", "tool_input": {"file_path": "src/lib.rs"}}"#;

    #[test]
    fn test_fifth_operation_triggers_first_capture() {
        let (_dir, ctx) = context(EDIT, Platform::Cowork);

        for _ in 0..4 {
            assert_eq!(handle(&ctx).unwrap(), HookResponse::Silent);
        }

        let HookResponse::Output(output) = handle(&ctx).unwrap() else {
            panic!("expected capture context");
        };
        assert!(output.text().starts_with("[GUTT Periodic Capture - Cowork]"));
        assert!(output.text().contains("(5 operations, 0min session, 0 memory queries, 0 lessons captured so far)"));

        let state = SessionStore::new(ctx.state.clone()).get();
        assert_eq!(state.significant_ops, 0);
        assert!(state.last_capture_prompt_at.is_some());
    }

    #[test]
    fn test_cooldown_after_prompt() {
        let (_dir, ctx) = context(EDIT, Platform::Cowork);
        SessionStore::new(ctx.state.clone())
            .update(|mut s| {
                s.significant_ops = 20;
                s.last_capture_prompt_at = Some(Utc::now() - Duration::minutes(3));
                s
            })
            .unwrap();

        assert_eq!(handle(&ctx).unwrap(), HookResponse::Silent);
        assert_eq!(SessionStore::new(ctx.state.clone()).get().significant_ops, 21);
    }

    #[test]
    fn test_cli_is_ignored() {
        let (_dir, ctx) = context(EDIT, Platform::Cli);
        handle(&ctx).unwrap();
        assert_eq!(SessionStore::new(ctx.state.clone()).get().significant_ops, 0);
    }

    #[test]
    fn test_memory_tasks_and_reads_do_not_count() {
        let memory_task = r#"{"tool_name": "Task", "tool_input": {"subagent_type": "gutt:Memory-Keeper"}}"#;
        let (_dir, ctx) = context(memory_task, Platform::Cowork);
        handle(&ctx).unwrap();
        assert_eq!(SessionStore::new(ctx.state.clone()).get().significant_ops, 0);

        let (_dir, ctx) = context(r#"{"tool_name": "Read"}"#, Platform::Cowork);
        handle(&ctx).unwrap();
        assert_eq!(SessionStore::new(ctx.state.clone()).get().significant_ops, 0);

        let worker_task = r#"{"tool_name": "Task", "tool_input": {"subagent_type": "executor"}}"#;
        let (_dir, ctx) = context(worker_task, Platform::Cowork);
        handle(&ctx).unwrap();
        assert_eq!(SessionStore::new(ctx.state.clone()).get().significant_ops, 1);
    }
}
