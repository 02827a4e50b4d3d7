//! SessionStart hook: configure the GUTT statusline on first run.
//!
//! Points `statusLine` in `~/.claude/settings.json` at the plugin's
//! statusline binary. A statusline the user already had is kept as the
//! passthrough command so its output still shows. Runs once per user: a
//! marker in `~/.claude` records that setup happened.

use camino::Utf8Path;
use chrono::Utc;
use hook_common::prelude::*;
use hook_common::settings::{load_settings_for_update, user_settings_path};
use hook_common::write_atomic;
use serde_json::{Map, Value, json};
use std::fs;
use std::process::ExitCode;

const MARKER: &str = ".gutt-statusline-configured";
const STATUSLINE_BINARY: &str = "bin/statusline";

fn main() -> ExitCode {
    run_hook("statusline-setup", handle)
}

fn handle(ctx: &HookContext) -> Result<HookResponse> {
    let Some(claude_dir) = ctx.env.user_claude_dir() else {
        return Ok(HookResponse::Silent);
    };
    let markers = StateManager::in_dir(claude_dir.clone());
    if markers.has_marker(MARKER) {
        return Ok(HookResponse::Silent);
    }

    let Some(plugin_root) = ctx.env.plugin_root.as_deref() else {
        ctx.log_error("CLAUDE_PLUGIN_ROOT not set, skipping statusline setup");
        return Ok(HookResponse::Silent);
    };
    let Some(settings_path) = user_settings_path(&ctx.env) else {
        return Ok(HookResponse::Silent);
    };

    let existing = match load_settings_for_update(&settings_path) {
        Ok(existing) => existing,
        Err(e) => {
            ctx.log_error(format!("{:#}, statusline not configured", e));
            return Ok(HookResponse::Silent);
        }
    };
    let settings = configure(existing, &statusline_command(plugin_root));

    fs::create_dir_all(&claude_dir)
        .with_context(|| format!("Failed to create directory: {}", claude_dir))?;
    write_atomic(&settings_path, &serde_json::to_string_pretty(&settings)?)?;
    markers.write(
        MARKER,
        &json!({
            "configuredAt": Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )?;

    Ok(HookResponse::text("✅ GUTT HUD enabled automatically"))
}

fn statusline_command(plugin_root: &Utf8Path) -> String {
    format!("\"{}\"", plugin_root.join(STATUSLINE_BINARY))
}

/// Install `command` as the statusline, keeping the previous one as passthrough.
fn configure(mut settings: Map<String, Value>, command: &str) -> Map<String, Value> {
    let previous = settings.get("statusLine").and_then(|existing| {
        existing
            .get("command")
            .and_then(Value::as_str)
            .or_else(|| existing.as_str())
            .map(str::to_string)
    });

    if let Some(previous) = previous.filter(|p| !p.is_empty() && p != command) {
        let gutt = settings.entry("gutt").or_insert_with(|| json!({}));
        if !gutt.is_object() {
            *gutt = json!({});
        }
        if let Some(gutt) = gutt.as_object_mut() {
            let statusline = gutt.entry("statusline").or_insert_with(|| json!({}));
            if !statusline.is_object() {
                *statusline = json!({});
            }
            statusline["passthroughCommand"] = Value::String(previous);
        }
    }

    settings.insert(
        "statusLine".to_string(),
        json!({"type": "command", "command": command}),
    );
    settings
}
