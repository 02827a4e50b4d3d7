//! JSONL transcript parsing.
//!
//! Transcripts are read leniently: unreadable files yield no entries and
//! malformed lines are skipped.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;

/// Expand a leading `~` against `home`.
pub fn expand_home(path: &str, home: Option<&Utf8Path>) -> Utf8PathBuf {
    match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) => Utf8PathBuf::from(format!("{}{}", home, rest)),
        _ => Utf8PathBuf::from(path),
    }
}

/// Parse every well-formed line of a transcript.
pub fn read_entries(path: &str, home: Option<&Utf8Path>) -> Vec<Value> {
    if path.is_empty() {
        return Vec::new();
    }

    let Ok(content) = fs::read_to_string(expand_home(path, home)) else {
        return Vec::new();
    };

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

/// Text of a message `content`: the string itself, or the first text block.
pub fn first_text(content: &Value) -> Option<&str> {
    match content {
        Value::String(s) => Some(s.as_str()),
        Value::Array(blocks) => blocks
            .iter()
            .find(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .and_then(|block| block.get("text"))
            .and_then(Value::as_str),
        _ => None,
    }
}

/// Text of a message `content` with all text blocks joined by newlines.
pub fn joined_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

pub fn is_user_message(entry: &Value) -> bool {
    entry.get("type").and_then(Value::as_str) == Some("user_message")
}

/// Tool name if the entry is a `tool_use`.
pub fn tool_use_name(entry: &Value) -> Option<&str> {
    if entry.get("type").and_then(Value::as_str) != Some("tool_use") {
        return None;
    }
    entry.get("name").and_then(Value::as_str)
}

/// User message text, if the entry is a user message.
pub fn user_text(entry: &Value) -> Option<&str> {
    if !is_user_message(entry) {
        return None;
    }
    entry.get("content").and_then(first_text)
}

/// Text of every assistant message, in both `{message:{role,content}}` and
/// flat `{role,content}` layouts.
pub fn assistant_messages(entries: &[Value]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| {
            let msg = entry.get("message").unwrap_or(entry);
            if msg.get("role").and_then(Value::as_str) != Some("assistant") {
                return None;
            }
            let text = joined_text(msg.get("content")?);
            (!text.is_empty()).then_some(text)
        })
        .collect()
}

/// Activity counts over a transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptSummary {
    /// First user message, flattened and cut to 100 chars
    pub first_user_message: Option<String>,
    pub user_message_count: usize,
    pub tool_call_count: usize,
    /// Distinct files touched by Edit/Write
    pub files_modified: usize,
}

impl TranscriptSummary {
    pub fn from_entries(entries: &[Value]) -> Self {
        let mut summary = Self::default();
        let mut files = HashSet::new();

        for entry in entries {
            if is_user_message(entry) {
                summary.user_message_count += 1;
                if summary.first_user_message.is_none() {
                    summary.first_user_message = user_text(entry).map(|text| {
                        text.chars()
                            .take(100)
                            .collect::<String>()
                            .replace('\n', " ")
                            .trim()
                            .to_string()
                    });
                }
            }

            if let Some(name) = tool_use_name(entry) {
                summary.tool_call_count += 1;
                if name == "Edit" || name == "Write" {
                    let file = entry
                        .get("input")
                        .or_else(|| entry.get("parameters"))
                        .and_then(|input| input.get("file_path"))
                        .and_then(Value::as_str);
                    if let Some(file) = file {
                        files.insert(file.to_string());
                    }
                }
            }
        }

        summary.files_modified = files.len();
        summary
    }

    /// One-line description of the activity.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(goal) = &self.first_user_message {
            parts.push(format!("Goal: {}", goal));
        }
        if self.files_modified > 0 {
            parts.push(format!("Modified {} file(s)", self.files_modified));
        }
        if self.tool_call_count > 0 {
            parts.push(format!("{} tool calls", self.tool_call_count));
        }
        if self.user_message_count > 0 {
            parts.push(format!("{} user messages", self.user_message_count));
        }

        if parts.is_empty() {
            "No significant activity".to_string()
        } else {
            parts.join(", ")
        }
    }
}
