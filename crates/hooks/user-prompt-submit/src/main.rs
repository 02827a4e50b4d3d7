//! UserPromptSubmit hook: remind the agent to search memory first.

use hook_common::prelude::*;
use hook_common::text::truncate_chars;
use hook_memory::terms::prompt_terms;
use hook_memory::MemoryTool;
use std::process::ExitCode;

fn main() -> ExitCode {
    run_hook("user-prompt-submit", handle)
}

fn handle(ctx: &HookContext) -> Result<HookResponse> {
    if !ctx.memory_service_registered() {
        return Ok(HookResponse::Silent);
    }

    let prompt = truncate_chars(ctx.input.prompt_text().unwrap_or("unknown"), 200);
    ctx.log_invocation(&format!("Prompt: {}", prompt));

    Ok(HookResponse::text(reminder(&prompt_terms(&prompt))))
}

fn reminder(terms: &str) -> String {
    let (facts_query, lessons_query) = if terms.is_empty() {
        ("relevant context".to_string(), "lessons".to_string())
    } else {
        (terms.to_string(), terms.to_string())
    };

    format!(
        "🟠 GUTT MEMORY: Search organizational memory BEFORE starting this task.\n\n\
         ACTION REQUIRED: Call one of these tools first:\n  \
         - {}(query: \"{}\")\n  \
         - {}(query: \"{}\")\n\n\
         This retrieves past decisions, patterns, and lessons that may apply to this task.",
        MemoryTool::SearchMemoryFacts.tool_name(),
        facts_query,
        MemoryTool::FetchLessonsLearned.tool_name(),
        lessons_query,
    )
}
