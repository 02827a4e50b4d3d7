//! SubagentStart hook: hand cached organizational memory to subagents.
//!
//! Injects the memory cache digest. With nothing cached, the subagent is told
//! how to fetch memory itself, using the query the PreToolUse(Task) hook left
//! in the cache.

use hook_common::prelude::*;
use hook_common::text::{sanitize_for_display, truncate_chars};
use hook_memory::{MemoryCache, MemoryTool};
use std::process::ExitCode;

const MEMORY_AGENTS: &[&str] = &["gutt-pro-memory", "memory-keeper", "gutt-mcp"];

const DEFAULT_QUERY: &str = "organizational context patterns";

fn main() -> ExitCode {
    run_hook("subagent-start-memory", handle)
}

fn handle(ctx: &HookContext) -> Result<HookResponse> {
    let agent_type = ctx.input.subagent_type().unwrap_or_default().to_lowercase();
    if MEMORY_AGENTS.iter().any(|agent| agent_type.contains(agent)) {
        return Ok(HookResponse::Silent);
    }

    let cache = MemoryCache::new(ctx.state.clone()).get();
    let context = match cache.format_for_injection() {
        Some(digest) => digest,
        None => {
            let query = cache.last_search_query.as_deref().unwrap_or(DEFAULT_QUERY);
            fallback_context(&sanitize_for_display(&truncate_chars(query, 100)))
        }
    };

    Ok(HookOutput::context(context)
        .with_event(HookEvent::SubagentStart)
        .into())
}

fn fallback_context(query: &str) -> String {
    format!(
        "[GUTT Memory]\n\
         No cached organizational memory available yet.\n\n\
         To fetch relevant context, use these MCP tools:\n\
         - {}(query: \"{}\")\n\
         - {}(query: \"{}\")\n\n\
         Apply any relevant lessons and patterns to inform your approach.\n\
         [End GUTT Memory]",
        MemoryTool::FetchLessonsLearned.tool_name(),
        query,
        MemoryTool::SearchMemoryFacts.tool_name(),
        query,
    )
}
