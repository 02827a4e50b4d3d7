//! PostToolUse(Task) hook: turn subagent results into memory work.
//!
//! Planner results get a plan-review context asking for related lessons.
//! Other results are scanned for lesson indicators; when any match, the agent
//! is asked to delegate capture to the memory-keeper agent.

use hook_common::prelude::*;
use hook_common::text::{sanitize_for_display, truncate_chars};
use hook_memory::terms::tech_terms;
use hook_memory::{Classifier, LessonIndicators, SessionStore};
use std::process::ExitCode;

/// Shorter results carry no lesson.
const MIN_RESULT_LEN: usize = 100;

const MEMORY_AGENTS: &[&str] = &["gutt-pro-memory", "memory-keeper", "memory-capture"];

fn main() -> ExitCode {
    run_hook("post-task-lessons", handle)
}

fn handle(ctx: &HookContext) -> Result<HookResponse> {
    if !ctx.input.is_task() {
        return Ok(HookResponse::Silent);
    }

    let result = ctx.input.response_text();
    if result.chars().count() < MIN_RESULT_LEN {
        return Ok(HookResponse::Silent);
    }

    let subagent_type = ctx.input.subagent_type().unwrap_or("unknown");
    if MEMORY_AGENTS.iter().any(|agent| subagent_type.contains(agent)) {
        return Ok(HookResponse::Silent);
    }

    if subagent_type.to_lowercase().contains("plan") {
        let context = plan_review_context(&result);
        return Ok(HookOutput::context(context)
            .with_event(HookEvent::PostToolUse)
            .into());
    }

    let labels = LessonIndicators.classify(&result);
    if labels.is_empty() {
        return Ok(HookResponse::Silent);
    }

    SessionStore::new(ctx.state.clone()).increment_lessons_captured()?;

    let context = lesson_capture_context(subagent_type, &labels, &result);
    Ok(HookOutput::context(context)
        .with_event(HookEvent::PostToolUse)
        .into())
}

fn plan_review_context(result: &str) -> String {
    let query = sanitize_for_display(&tech_terms(result));
    let summary = sanitize_for_display(&truncate_chars(result, 200));
    format!(
        "[GUTT Plan Review]\n\
         A plan was created. Before implementing it, delegate to memory-keeper agent:\n\n\
         Task(subagent_type=\"memory-keeper\", model=\"haiku\", prompt=\"Search for lessons and context about: {}\")\n\n\
         Plan summary: \"{}...\"",
        query, summary
    )
}

fn lesson_capture_context(subagent_type: &str, labels: &[&str], result: &str) -> String {
    let preview = sanitize_for_display(&truncate_chars(result, 100));
    format!(
        "[GUTT Lesson Capture Opportunity]\n\
         Subagent \"{}\" completed with potential lessons:\n\n\
         Detected patterns: {}\n\n\
         Consider capturing lessons using memory-keeper agent:\n\n\
         Task(subagent_type=\"memory-keeper\", model=\"haiku\", prompt=\"Review and capture lessons from this task result: {preview}...\")\n\n\
         Task context: \"{preview}...\"",
        subagent_type,
        labels.join(", "),
        preview = preview,
    )
}
