//! PreToolUse(Task) hook: point the subagent at organizational memory.
//!
//! Derives a search query from the task prompt and subagent type, records it
//! in the cache's query history and hands it off to the SubagentStart hook
//! through the cache's last-search-query slot.

use hook_common::prelude::*;
use hook_memory::terms::task_query;
use hook_memory::{MemoryCache, MemoryTool};
use std::process::ExitCode;

/// Subagents that already work against memory.
const MEMORY_AGENTS: &[&str] = &["gutt-pro-memory", "memory-keeper"];

fn main() -> ExitCode {
    run_hook("pre-task-memory", handle)
}

fn handle(ctx: &HookContext) -> Result<HookResponse> {
    if !ctx.input.is_task() || !ctx.memory_service_registered() {
        return Ok(HookResponse::Silent);
    }

    let subagent_type = ctx.input.subagent_type().unwrap_or_default();
    if MEMORY_AGENTS.iter().any(|agent| subagent_type.contains(agent)) {
        return Ok(HookResponse::Silent);
    }

    let prompt = ctx.input.tool_input.prompt.as_deref().unwrap_or_default();
    let query = task_query(prompt, subagent_type);

    let cache = MemoryCache::new(ctx.state.clone());
    cache.record_query(&query)?;
    cache.set_last_search_query(&query)?;

    Ok(HookResponse::text(memory_context(&query)))
}

fn memory_context(query: &str) -> String {
    format!(
        "[GUTT Memory Context]\n\
         Before starting this task, search organizational memory for relevant context.\n\n\
         Search query: \"{query}\"\n\n\
         Use these tools:\n\
         - {lessons}(query: \"{query}\")\n\
         - {facts}(query: \"{query}\")\n\n\
         Apply any relevant lessons and patterns to inform your approach.\n\
         [End GUTT Memory Context]",
        query = query,
        lessons = MemoryTool::FetchLessonsLearned.tool_name(),
        facts = MemoryTool::SearchMemoryFacts.tool_name(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn registered_project() -> (TempDir, Utf8PathBuf) {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(root.join(".mcp.json"), r#"{"gutt-mcp-remote": {}}"#).unwrap();
        (dir, root)
    }

    fn context(root: &Utf8PathBuf, raw: &str) -> HookContext {
        let input = HookInput::parse(raw).unwrap();
        HookContext::new("pre-task-memory", input, HookEnv::for_project(root))
            .with_state(StateManager::in_memory())
    }

    #[test]
    fn test_records_query_and_handoff() {
        let (_dir, root) = registered_project();
        let ctx = context(
            &root,
            r#"{"tool_name": "Task", "tool_input": {"prompt": "Review the billing retry logic", "subagent_type": "code-reviewer"}}"#,
        );

        let HookResponse::Text(text) = handle(&ctx).unwrap() else {
            panic!("expected memory context");
        };
        assert!(text.starts_with("[GUTT Memory Context]"));
        assert!(text.contains("Search query: \"review billing retry logic code reviewer\""));
        assert!(text.ends_with("[End GUTT Memory Context]"));

        let cache = MemoryCache::new(ctx.state.clone());
        assert_eq!(
            cache.last_search_query().as_deref(),
            Some("review billing retry logic code reviewer")
        );
        assert_eq!(cache.get().queries.len(), 1);
    }

    #[test]
    fn test_skips_memory_agents() {
        let (_dir, root) = registered_project();
        let ctx = context(
            &root,
            r#"{"tool_name": "Task", "tool_input": {"prompt": "store this", "subagent_type": "gutt:memory-keeper"}}"#,
        );
        assert_eq!(handle(&ctx).unwrap(), HookResponse::Silent);
        assert!(MemoryCache::new(ctx.state.clone()).last_search_query().is_none());
    }

    #[test]
    fn test_ignores_other_tools() {
        let (_dir, root) = registered_project();
        let ctx = context(&root, r#"{"tool_name": "Edit", "tool_input": {"file_path": "a.rs"}}"#);
        assert_eq!(handle(&ctx).unwrap(), HookResponse::Silent);
    }
}
