//! Logging for hooks.
//!
//! Three append-only files, all best-effort:
//! - `.claude/hooks/hook-invocations.log`: plain-text record of gate decisions
//!   and prompts
//! - `.claude/hooks/.state/hook-errors.log`: errors swallowed by the runner
//! - `.claude/logs/hook-debug.jsonl`: structured decisions, only in debug mode

use crate::env::HookEnv;
use crate::text::truncate_chars;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Debug log entry for a hook decision
#[derive(Debug, Serialize)]
pub struct HookDebugLog {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Hook name (e.g., "stop-lessons")
    pub hook_name: String,
    /// Host event name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Session the decision applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Decision made (block/inject/allow/skip)
    pub decision: String,
    /// Reason for the decision
    pub reason: String,
    /// Additional context (truncated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl HookDebugLog {
    pub fn new(hook_name: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            hook_name: hook_name.to_string(),
            event: None,
            session_id: None,
            decision: String::new(),
            reason: String::new(),
            context: None,
        }
    }

    pub fn with_event(mut self, event: &str) -> Self {
        self.event = Some(event.to_string());
        self
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn with_decision(mut self, decision: &str, reason: &str) -> Self {
        self.decision = decision.to_string();
        self.reason = reason.to_string();
        self
    }

    pub fn with_context(mut self, context: &str) -> Self {
        // Keep log lines small
        self.context = Some(truncate_chars(context, 200));
        self
    }

    /// Append the entry to the debug log if debug mode is on.
    pub fn write(&self, env: &HookEnv) -> std::io::Result<()> {
        if !is_debug_enabled(env) {
            return Ok(());
        }

        let json = serde_json::to_string(self).unwrap_or_default();
        append_line(&debug_log_path(env), &json)
    }
}

/// Debug mode: `CLAUDE_HOOK_DEBUG` set, or `.claude/.hook-debug` present.
pub fn is_debug_enabled(env: &HookEnv) -> bool {
    env.debug || env.project_dir.join(".claude").join(".hook-debug").exists()
}

/// `.claude/logs/hook-debug.jsonl`
pub fn debug_log_path(env: &HookEnv) -> Utf8PathBuf {
    env.project_dir
        .join(".claude")
        .join("logs")
        .join("hook-debug.jsonl")
}

/// `.claude/hooks/.state/hook-errors.log`
pub fn error_log_path(env: &HookEnv) -> Utf8PathBuf {
    env.state_dir().join("hook-errors.log")
}

/// `.claude/hooks/hook-invocations.log`
pub fn invocation_log_path(env: &HookEnv) -> Utf8PathBuf {
    env.hooks_dir().join("hook-invocations.log")
}

/// Quick helper to log a hook decision
pub fn log_decision(
    env: &HookEnv,
    hook_name: &str,
    session_id: &str,
    decision: &str,
    reason: &str,
) {
    let log = HookDebugLog::new(hook_name)
        .with_session(session_id)
        .with_decision(decision, reason);

    let _ = log.write(env);
}

/// Record an error the hook swallowed.
pub fn log_error(env: &HookEnv, hook_name: &str, error: impl Display) {
    let line = format!("{} [{}] {}", Utc::now().to_rfc3339(), hook_name, error);
    let _ = append_line(&error_log_path(env), &line);
}

/// Record a line in the invocation log.
pub fn log_invocation(env: &HookEnv, message: &str) {
    let line = format!("[{}] {}", Utc::now().format("%Y-%m-%d %H:%M:%S"), message);
    let _ = append_line(&invocation_log_path(env), &line);
}

fn append_line(path: &Utf8Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn temp_env(dir: &tempfile::TempDir) -> HookEnv {
        HookEnv::for_project(Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap())
    }

    #[test]
    fn test_debug_log_serialization() {
        let log = HookDebugLog::new("stop-lessons")
            .with_event("Stop")
            .with_session("abc")
            .with_decision("block", "significant work detected");

        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains("stop-lessons"));
        assert!(json.contains("\"decision\":\"block\""));
        assert!(!json.contains("\"context\""));
    }

    #[test]
    fn test_context_truncation() {
        let long_context = "a".repeat(500);
        let log = HookDebugLog::new("test").with_context(&long_context);

        assert_eq!(log.context.unwrap().chars().count(), 200);
    }

    #[test]
    fn test_debug_log_only_written_in_debug_mode() {
        let dir = tempdir().unwrap();
        let mut env = temp_env(&dir);

        log_decision(&env, "hook", "s1", "skip", "quiet");
        assert!(!debug_log_path(&env).exists());

        env.debug = true;
        log_decision(&env, "hook", "s1", "skip", "loud");
        let content = fs::read_to_string(debug_log_path(&env)).unwrap();
        assert!(content.contains("loud"));
    }

    #[test]
    fn test_error_and_invocation_logs_append() {
        let dir = tempdir().unwrap();
        let env = temp_env(&dir);

        log_error(&env, "session-start", "first");
        log_error(&env, "session-start", "second");
        log_invocation(&env, "Prompt: hello");

        let errors = fs::read_to_string(error_log_path(&env)).unwrap();
        assert_eq!(errors.lines().count(), 2);
        assert!(errors.contains("[session-start] second"));

        let invocations = fs::read_to_string(invocation_log_path(&env)).unwrap();
        assert!(invocations.trim_end().ends_with("] Prompt: hello"));
    }
}
