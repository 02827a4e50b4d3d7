//! Stop hook: capture session lessons before the agent stops.
//!
//! Two once-per-session gates, checked in order:
//! 1. Plan feedback: the transcript shows a planner Task followed by a
//!    rejection or modification. The agent is asked to record the feedback.
//! 2. Session lessons: unless the session was trivial, the agent is asked to
//!    delegate lesson capture to the memory-keeper agent.
//!
//! A gate fires only for the call that creates its marker. On CLI the stop
//! is blocked; Cowork cannot block, so the prompt goes in as context.

use chrono::Utc;
use hook_common::prelude::*;
use hook_common::text::sanitize_for_display;
use hook_common::transcript::{TranscriptSummary, read_entries};
use hook_memory::plan_feedback::{
    build_capture_instruction, detect_plan_context, extract_plan_feedback,
};
use hook_memory::{
    CaptureGate, FeedbackPatterns, Gate, GateCheck, PlanFeedback, SessionState, SessionStore,
};
use serde_json::Value;
use std::process::ExitCode;

/// Sessions shorter than this with no memory queries count as trivial.
const TRIVIAL_SESSION_MINUTES: i64 = 10;

fn main() -> ExitCode {
    run_hook("stop-lessons", handle)
}

fn handle(ctx: &HookContext) -> Result<HookResponse> {
    if !ctx.memory_service_registered() {
        return Ok(HookResponse::Silent);
    }

    let sessions = SessionStore::new(ctx.state.clone());
    let session_id = match ctx.input.session_id() {
        Some(id) => id.to_string(),
        None => sessions.ensure_session_id()?,
    };

    let entries = ctx
        .input
        .transcript_path
        .as_deref()
        .map(|path| read_entries(path, ctx.env.home_dir.as_deref()))
        .unwrap_or_default();
    let gates = CaptureGate::new(ctx.state.clone());

    if let Some(feedback) = actionable_plan_feedback(&entries) {
        return plan_feedback_gate(ctx, &gates, &session_id, &feedback);
    }

    lessons_gate(ctx, &gates, &sessions.get(), &session_id, &entries)
}

fn actionable_plan_feedback(entries: &[Value]) -> Option<PlanFeedback> {
    let plan = detect_plan_context(entries)?;
    extract_plan_feedback(entries, &plan, &FeedbackPatterns).filter(PlanFeedback::is_actionable)
}

fn plan_feedback_gate(
    ctx: &HookContext,
    gates: &CaptureGate,
    session_id: &str,
    feedback: &PlanFeedback,
) -> Result<HookResponse> {
    if gates.try_fire(session_id, Gate::PlanFeedbackPrompted)? == GateCheck::AlreadyHandled {
        ctx.log_invocation(&format!(
            "Stop hook: Plan feedback already prompted for session {}, allowing stop",
            session_id
        ));
        return Ok(HookResponse::Silent);
    }

    let instruction = build_capture_instruction(feedback);
    let output = HookOutput::for_platform(
        ctx.platform,
        instruction.clone(),
        format!("[Cowork] Session ending with uncaptured plan feedback. {}", instruction),
    );

    ctx.log_invocation(&format!(
        "Stop hook: {} for plan feedback in session {}",
        if output.is_block() { "Blocking stop" } else { "Cowork context" },
        session_id
    ));
    ctx.log_decision(session_id, decision_name(&output), "uncaptured plan feedback");
    Ok(output.into())
}

fn lessons_gate(
    ctx: &HookContext,
    gates: &CaptureGate,
    state: &SessionState,
    session_id: &str,
    entries: &[Value],
) -> Result<HookResponse> {
    if gates.is_handled(session_id, Gate::LessonsPrompted) {
        ctx.log_invocation(&format!(
            "Stop hook: Session {} already prompted, allowing stop",
            session_id
        ));
        return Ok(HookResponse::Silent);
    }

    let duration = state.duration_minutes(Utc::now());
    if is_trivial(state, duration) {
        ctx.log_invocation(&format!(
            "Stop hook: Trivial session (queries={}, duration={}m, captured={}), allowing stop",
            state.memory_queries, duration, state.lessons_captured
        ));
        return Ok(HookResponse::Silent);
    }

    // A concurrent stop may have created the marker since the check above.
    if gates.try_fire(session_id, Gate::LessonsPrompted)? == GateCheck::AlreadyHandled {
        return Ok(HookResponse::Silent);
    }

    let summary = TranscriptSummary::from_entries(entries);
    let prompt = capture_prompt(state, duration, &summary);
    let output = HookOutput::for_platform(
        ctx.platform,
        format!(
            "🟠 ACTION REQUIRED: Capture session lessons before stopping.\n\n{}\n\n\
             Or describe what you learned and I'll format it properly.",
            prompt
        ),
        cowork_context(state.lessons_captured, &prompt),
    );

    ctx.log_invocation(&format!(
        "Stop hook: {} for session {} - significant work detected",
        if output.is_block() { "Blocking stop" } else { "Cowork context" },
        session_id
    ));
    ctx.log_decision(session_id, decision_name(&output), "session lessons not captured");
    Ok(output.into())
}

fn decision_name(output: &HookOutput) -> &'static str {
    if output.is_block() { "block" } else { "context" }
}

fn is_trivial(state: &SessionState, duration_minutes: i64) -> bool {
    state.memory_queries == 0
        && duration_minutes < TRIVIAL_SESSION_MINUTES
        && state.lessons_captured > 0
}

fn capture_prompt(
    state: &SessionState,
    duration_minutes: i64,
    summary: &TranscriptSummary,
) -> String {
    let goal = summary
        .first_user_message
        .as_deref()
        .unwrap_or("Session work (no goal extracted)");

    let session_summary = format!(
        "## Session Summary\n\
         - Goal: {}\n\
         - Duration: {} minutes\n\
         - Files modified: {}\n\
         - Memory queries: {}\n\n\
         ## Work Done\n\
         {}",
        goal,
        duration_minutes,
        summary.files_modified,
        state.memory_queries,
        summary.describe()
    );

    format!(
        "Session Context:\n\
         - Duration: {} minutes\n\
         - Files modified: {}\n\
         - Memory queries: {}\n\
         - Lessons captured: {}\n\n\
         Delegate to memory-keeper agent to capture lessons:\n\n\
         Task(subagent_type=\"memory-keeper\", model=\"haiku\", \
         prompt=\"Capture session lessons with this context:\n\n\
         {}\n\n\
         Create a memory with name 'Session: {}' \
         containing the key lessons and findings from this session.\")",
        duration_minutes,
        summary.files_modified,
        state.memory_queries,
        state.lessons_captured,
        sanitize_for_display(&session_summary),
        sanitize_for_display(goal),
    )
}

fn cowork_context(lessons_captured: u64, prompt: &str) -> String {
    let tail = if lessons_captured == 0 {
        format!(" WARNING: No lessons captured this session. {}", prompt)
    } else {
        " Periodic capture handled lesson collection.".to_string()
    };
    format!(
        "[Cowork] Session ending. {} lessons captured during session.{}",
        lessons_captured, tail
    )
}
