//! End-to-end runs of the subagent-start-memory binary.

use assert_cmd::Command;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

fn hook(project: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("subagent-start-memory").unwrap();
    cmd.env("CLAUDE_PROJECT_DIR", project.path())
        .env("HOME", project.path().join("home"))
        .env_remove("CLAUDE_PLATFORM")
        .env_remove("CLAUDE_HOOK_DEBUG");
    cmd
}

fn write_cache(project: &TempDir, cache: &Value) {
    let state_dir = project.path().join(".claude/hooks/.state");
    fs::create_dir_all(&state_dir).unwrap();
    fs::write(state_dir.join("gutt-memory-cache.json"), cache.to_string()).unwrap();
}

fn run(project: &TempDir, input: &str) -> Value {
    let output = hook(project).write_stdin(input.to_string()).output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn injects_cached_digest() {
    let project = TempDir::new().unwrap();
    write_cache(
        &project,
        &json!({
            "lessons": [{"summary": "Run migrations before deploy", "outcome": "negative", "guidance": "Gate deploys on migration status"}],
            "facts": [],
            "queries": ["deploy"],
        }),
    );

    let output = run(&project, r#"{"agent_type": "executor"}"#);
    let context = output["hookSpecificOutput"]["additionalContext"].as_str().unwrap();
    assert_eq!(output["hookSpecificOutput"]["hookEventName"], "SubagentStart");
    assert!(context.starts_with("[GUTT Organizational Memory]"));
    assert!(context.contains("1. Run migrations before deploy (negative)"));
    assert!(context.contains("   Guidance: Gate deploys on migration status"));
}

#[test]
fn falls_back_to_handoff_query() {
    let project = TempDir::new().unwrap();
    write_cache(&project, &json!({"lastSearchQuery": "deploy pipeline executor"}));

    let output = run(&project, r#"{"agent_type": "executor"}"#);
    let context = output["hookSpecificOutput"]["additionalContext"].as_str().unwrap();
    assert!(context.contains("fetch_lessons_learned(query: \"deploy pipeline executor\")"));
    assert!(context.ends_with("[End GUTT Memory]"));
}

#[test]
fn corrupt_cache_reads_as_empty() {
    let project = TempDir::new().unwrap();
    let state_dir = project.path().join(".claude/hooks/.state");
    fs::create_dir_all(&state_dir).unwrap();
    fs::write(state_dir.join("gutt-memory-cache.json"), "{truncated").unwrap();

    let output = run(&project, "{}");
    let context = output["hookSpecificOutput"]["additionalContext"].as_str().unwrap();
    assert!(context.contains("(query: \"organizational context patterns\")"));
}
