//! Host settings documents: memory-service registration and user-scope
//! statusline flags.

use crate::config::StatuslineConfig;
use crate::env::HookEnv;
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};
use std::fs;
use std::io;

/// Server key the memory service is registered under.
pub const MEMORY_SERVER_NAME: &str = "gutt-mcp-remote";

/// Parse a JSON file, `None` when absent or malformed.
pub fn read_json(path: &Utf8Path) -> Option<Value> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// `~/.claude/settings.json`
pub fn user_settings_path(env: &HookEnv) -> Option<Utf8PathBuf> {
    env.user_claude_dir().map(|dir| dir.join("settings.json"))
}

/// User settings as a JSON object; an empty object when missing or not an object.
pub fn load_user_settings(env: &HookEnv) -> Map<String, Value> {
    match user_settings_path(env).as_deref().and_then(read_json) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// A settings document about to be rewritten.
///
/// A missing file is an empty object. A file that cannot be read, does not
/// parse, or is not an object is an error, so the caller never replaces
/// settings it could not see.
pub fn load_settings_for_update(path: &Utf8Path) -> Result<Map<String, Value>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read settings: {}", path)),
    };
    let doc: Value = serde_json::from_str(&content)
        .with_context(|| format!("Malformed settings: {}", path))?;
    match doc {
        Value::Object(map) => Ok(map),
        _ => bail!("Settings are not a JSON object: {}", path),
    }
}

/// Is the memory service registered at user or project scope?
pub fn is_memory_service_registered(env: &HookEnv) -> bool {
    let user = load_user_settings(env);
    if has_server(user.get("mcpServers")) {
        return true;
    }

    let project = read_json(&env.project_dir.join(".mcp.json"));
    match project {
        Some(doc) => doc.get(MEMORY_SERVER_NAME).is_some() || has_server(doc.get("mcpServers")),
        None => false,
    }
}

fn has_server(servers: Option<&Value>) -> bool {
    servers
        .and_then(|servers| servers.get(MEMORY_SERVER_NAME))
        .is_some_and(|entry| !entry.is_null())
}

/// `gutt.statusline` from user settings, if present.
pub fn user_statusline(env: &HookEnv) -> Option<StatuslineConfig> {
    let settings = load_user_settings(env);
    let section = settings.get("gutt")?.get("statusline")?.clone();
    serde_json::from_value(section).ok()
}
