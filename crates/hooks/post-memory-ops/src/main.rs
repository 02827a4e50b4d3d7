//! PostToolUse hook for the memory-service tools.
//!
//! Tracks what the agent does with memory: connection status, query and
//! lesson counters, a ticker entry for the statusline, and the lessons or
//! facts a search returned, merged into the memory cache for subagents.

use hook_common::prelude::*;
use hook_common::text::truncate_with_ellipsis;
use hook_memory::{
    CacheBatch, ConnectionStatus, MemoryCache, MemoryTool, ResponseError, ServiceResponse,
    SessionStore, TickerItem,
};
use serde_json::Value;
use std::process::ExitCode;

fn main() -> ExitCode {
    run_hook("post-memory-ops", handle)
}

fn handle(ctx: &HookContext) -> Result<HookResponse> {
    let Some(tool) = MemoryTool::from_tool_name(&ctx.input.tool_name) else {
        return Ok(HookResponse::Silent);
    };

    let session = SessionStore::new(ctx.state.clone());
    let response = ctx.input.response().map(ServiceResponse::normalize);

    let status = match &response {
        Some(Err(ResponseError::Service(message))) => {
            ctx.log_error(format!("{} failed: {}", tool.tool_name(), message));
            ConnectionStatus::Error
        }
        _ => ConnectionStatus::Ok,
    };

    let item = ticker_item(ctx, tool, response.as_ref());
    session.update(|mut s| {
        s.connection_status = status;
        if tool.is_query() {
            s.memory_queries += 1;
        } else {
            s.lessons_captured += 1;
        }
        s.ticker.push(item);
        s
    })?;

    if tool.is_query() {
        cache_results(ctx, tool, response)?;
    }

    Ok(HookResponse::Silent)
}

fn ticker_item(
    ctx: &HookContext,
    tool: MemoryTool,
    response: Option<&Result<ServiceResponse, ResponseError>>,
) -> TickerItem {
    match tool {
        MemoryTool::AddMemory => {
            let name = ctx.input.tool_input.name.as_deref().unwrap_or("memory");
            TickerItem::now("📤", &format!("Created \"{}\"", truncate_with_ellipsis(name, 25)))
        }
        MemoryTool::SearchMemoryFacts | MemoryTool::FetchLessonsLearned => {
            let query = ctx
                .input
                .tool_input
                .query
                .as_deref()
                .unwrap_or(tool.default_query());
            let first = response
                .and_then(|r| r.as_ref().ok())
                .and_then(ServiceResponse::first_result)
                .unwrap_or("found");
            let text = format!(
                "Fetched \"{}\" → \"{}\"",
                truncate_with_ellipsis(query, 15),
                truncate_with_ellipsis(first, 15)
            );
            TickerItem::now("📥", &text)
        }
    }
}

fn cache_results(
    ctx: &HookContext,
    tool: MemoryTool,
    response: Option<Result<ServiceResponse, ResponseError>>,
) -> Result<()> {
    let cache = MemoryCache::new(ctx.state.clone());
    if let Some(query) = ctx.input.tool_input.query.as_deref() {
        cache.record_query(query)?;
    }

    match response {
        Some(Ok(response)) => {
            if let Some(batch) = CacheBatch::from_response(response) {
                cache.update(batch)?;
            }
        }
        Some(Err(ResponseError::Service(_))) | None => {}
        Some(Err(e)) => ctx.log_error(format!(
            "Unrecognized {} response: {} ({})",
            tool.tool_name(),
            e,
            preview(ctx.input.response())
        )),
    }
    Ok(())
}

fn preview(raw: Option<&Value>) -> String {
    raw.map(|v| v.to_string().chars().take(120).collect())
        .unwrap_or_default()
}
