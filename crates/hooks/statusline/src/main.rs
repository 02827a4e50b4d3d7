//! Statusline command: GUTT connection status and session counters.
//!
//! Renders `[gutt<icon><!> <group> mem:<n> lessons:<n>]`, optionally after the
//! output of another statusline command (the passthrough) and with a ticker
//! toast for recent memory operations.

use chrono::Utc;
use hook_common::prelude::*;
use hook_common::settings::user_statusline;
use hook_common::subprocess::run_with_input;
use hook_common::HookDebugLog;
use hook_memory::{ConnectionStatus, SessionState, SessionStore, TickerItem};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::process::ExitCode;
use std::time::Duration;

const PASSTHROUGH_TIMEOUT: Duration = Duration::from_millis(500);

/// How long a ticker item stays visible, in milliseconds.
const TICKER_DISPLAY_MS: i64 = 5000;

/// Command chaining, substitution, redirection and line breaks.
static UNSAFE_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[;&|`<>\r\n]|\$\(").expect("valid regex"));

fn main() -> ExitCode {
    run_hook("statusline", handle)
}

fn handle(ctx: &HookContext) -> Result<HookResponse> {
    let state = SessionStore::new(ctx.state.clone()).get();
    let flags = merge_flags(user_statusline(&ctx.env), ctx.config.statusline());

    let segment = gutt_segment(&state, ctx.config.group_id(), ctx.config.is_configured());
    let host = host_segment(&ctx.input.extra);
    let ticker = if flags.show_ticker {
        fresh_ticker(&state.ticker.items, Utc::now().timestamp_millis())
    } else {
        None
    };

    let passthrough = flags
        .passthrough_command
        .as_deref()
        .filter(|cmd| is_safe_command(ctx, cmd))
        .and_then(|cmd| run_passthrough(ctx, cmd));

    Ok(HookResponse::text(compose(
        passthrough.as_deref(),
        &segment,
        &host,
        ticker.as_deref(),
        flags.multi_line,
    )))
}

/// User settings win for the command; a flag set in either place is on.
fn merge_flags(user: Option<StatuslineConfig>, project: StatuslineConfig) -> StatuslineConfig {
    let user = user.unwrap_or_default();
    StatuslineConfig {
        passthrough_command: user
            .passthrough_command
            .filter(|c| !c.is_empty())
            .or(project.passthrough_command.filter(|c| !c.is_empty())),
        multi_line: user.multi_line || project.multi_line,
        show_ticker: user.show_ticker || project.show_ticker,
    }
}

fn gutt_segment(state: &SessionState, group_id: &str, configured: bool) -> String {
    let icon = match state.connection_status {
        ConnectionStatus::Ok => "🟢",
        ConnectionStatus::Error => "🔴",
        ConnectionStatus::Unknown => "⚪",
    };
    let warning = if configured { "" } else { "!" };
    let group = if group_id.is_empty() {
        "(no group_id)".to_string()
    } else if group_id.chars().count() > 15 {
        format!("{}...", group_id.chars().take(12).collect::<String>())
    } else {
        group_id.to_string()
    };

    format!(
        "[gutt{}{} {} mem:{} lessons:{}]",
        icon, warning, group, state.memory_queries, state.lessons_captured
    )
}

/// ` | [<model>] ~$<cost>` from the host's statusline payload.
fn host_segment(payload: &HashMap<String, Value>) -> String {
    let model = payload
        .get("model")
        .and_then(|m| m.get("display_name"))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty());
    let cost = payload
        .get("cost")
        .and_then(|c| c.get("total_cost_usd"))
        .and_then(Value::as_f64);

    if model.is_none() && cost.is_none() {
        return String::new();
    }

    let cost = cost.map(|c| format!(" ~${:.2}", c)).unwrap_or_default();
    format!(" | [{}]{}", model.unwrap_or("unknown"), cost)
}

/// Most recent item younger than the display window.
fn fresh_ticker(items: &[TickerItem], now_ms: i64) -> Option<String> {
    items
        .iter()
        .filter(|item| now_ms - item.created_at < TICKER_DISPLAY_MS)
        .max_by_key(|item| item.created_at)
        .map(|item| format!("{} {}", item.icon, item.text))
}

fn is_safe_command(ctx: &HookContext, cmd: &str) -> bool {
    if UNSAFE_COMMAND.is_match(cmd) {
        let _ = HookDebugLog::new(ctx.name)
            .with_decision("skip", "passthrough command rejected")
            .with_context(cmd)
            .write(&ctx.env);
        return false;
    }
    true
}

/// Trimmed passthrough output; `None` on failure, timeout or empty output.
fn run_passthrough(ctx: &HookContext, cmd: &str) -> Option<String> {
    let payload = serde_json::to_string(&ctx.input).unwrap_or_default();
    match run_with_input(cmd, payload.as_bytes(), PASSTHROUGH_TIMEOUT) {
        Ok(result) => {
            let output = result.stdout.trim().to_string();
            (!output.is_empty()).then_some(output)
        }
        Err(e) => {
            let _ = HookDebugLog::new(ctx.name)
                .with_decision("fallback", "passthrough command failed")
                .with_context(&format!("{:#}", e))
                .write(&ctx.env);
            None
        }
    }
}

fn compose(
    passthrough: Option<&str>,
    segment: &str,
    host: &str,
    ticker: Option<&str>,
    multi_line: bool,
) -> String {
    match (passthrough, ticker) {
        (Some(pass), Some(ticker)) if multi_line => format!("{}\n{}\n{}", pass, segment, ticker),
        (Some(pass), None) if multi_line => format!("{}\n{}", pass, segment),
        (Some(pass), Some(ticker)) => format!("{} {}\n{}", pass, segment, ticker),
        (Some(pass), None) => format!("{} {}", pass, segment),
        (None, Some(ticker)) => format!("{}{}\n{}", segment, host, ticker),
        (None, None) => format!("{}{}", segment, host),
    }
}
