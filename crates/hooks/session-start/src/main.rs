//! SessionStart hook: start every session with an empty memory cache.
//!
//! Cached lessons and facts belong to the session that fetched them. When the
//! memory service is not registered, a one-line setup reminder is printed
//! instead of any memory instructions.

use hook_common::prelude::*;
use hook_memory::MemoryCache;
use std::process::ExitCode;

const SETUP_REMINDER: &str = "💡 gutt memory features are available but not configured.\n\n\
Run /gutt-claude-code-plugin:setup to enable organizational memory integration.";

fn main() -> ExitCode {
    run_hook("session-start", handle)
}

fn handle(ctx: &HookContext) -> Result<HookResponse> {
    if let Err(e) = MemoryCache::new(ctx.state.clone()).clear() {
        ctx.log_error(format!("Failed to clear memory cache: {:#}", e));
    }

    if !ctx.memory_service_registered() {
        return Ok(HookResponse::text(SETUP_REMINDER));
    }

    Ok(HookResponse::Silent)
}
