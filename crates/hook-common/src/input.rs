//! Hook input parsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Event payload received from the host.
///
/// Every field is optional; events only carry what their hook point needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookInput {
    /// The name of the tool being called (e.g., "Task", "Edit", "Write")
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tool_name: String,

    /// Tool-specific input parameters
    #[serde(default, skip_serializing_if = "ToolInput::is_empty")]
    pub tool_input: ToolInput,

    /// Tool result (for PostToolUse hooks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_response: Option<Value>,

    /// Older hosts send the result under this name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<Value>,

    /// Hook event name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_event_name: Option<String>,

    /// User prompt (for UserPromptSubmit hooks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Free-form message some events carry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Session ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Main conversation transcript (JSONL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,

    /// Subagent type for SubagentStart/SubagentStop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,

    /// Subagent transcript (JSONL) for SubagentStop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_transcript_path: Option<String>,

    /// Additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Tool input parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInput {
    /// Prompt for Task tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Subagent type for Task tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subagent_type: Option<String>,

    /// Search query for memory tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Episode name for add_memory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// File path for Edit/Write tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ToolInput {
    pub fn is_empty(&self) -> bool {
        self.prompt.is_none()
            && self.subagent_type.is_none()
            && self.query.is_none()
            && self.name.is_none()
            && self.file_path.is_none()
            && self.extra.is_empty()
    }
}

impl HookInput {
    /// Parse an event. Blank input is an empty event.
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
    }

    /// Tool result, whichever field the host used.
    pub fn response(&self) -> Option<&Value> {
        self.tool_response
            .as_ref()
            .or(self.tool_result.as_ref())
            .or_else(|| self.extra.get("result"))
    }

    /// Tool result as text. Strings pass through, content-block arrays are
    /// joined, anything else is serialized.
    pub fn response_text(&self) -> String {
        match self.response() {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(blocks)) => blocks
                .iter()
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
            Some(Value::Object(obj)) => match obj.get("content") {
                Some(Value::Array(blocks)) => blocks
                    .iter()
                    .filter_map(|block| block.get("text").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("\n"),
                _ => Value::Object(obj.clone()).to_string(),
            },
            Some(other) => other.to_string(),
        }
    }

    /// User prompt, from `prompt` or `message`.
    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt
            .as_deref()
            .or(self.message.as_deref())
            .filter(|p| !p.trim().is_empty())
    }

    /// Session id, if present and non-empty.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Check if this is an Edit tool call.
    pub fn is_edit(&self) -> bool {
        self.tool_name == "Edit"
    }

    /// Check if this is a Write tool call.
    pub fn is_write(&self) -> bool {
        self.tool_name == "Write"
    }

    /// Check if this is a Task tool call.
    pub fn is_task(&self) -> bool {
        self.tool_name == "Task"
    }

    /// Subagent type from the Task input or the SubagentStart/Stop payload.
    pub fn subagent_type(&self) -> Option<&str> {
        self.tool_input
            .subagent_type
            .as_deref()
            .or(self.agent_type.as_deref())
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_task_input() {
        let json = r#"{"tool_name": "Task", "tool_input": {"prompt": "Plan the migration", "subagent_type": "Plan"}}"#;
        let input = HookInput::parse(json).unwrap();
        assert!(input.is_task());
        assert_eq!(input.tool_input.prompt.as_deref(), Some("Plan the migration"));
        assert_eq!(input.subagent_type(), Some("Plan"));
    }

    #[test]
    fn test_parse_blank_input_is_default() {
        let input = HookInput::parse("  \n").unwrap();
        assert!(input.tool_name.is_empty());
        assert!(input.session_id().is_none());
    }

    #[test]
    fn test_parse_invalid_json_is_error() {
        assert!(HookInput::parse("{not json").is_err());
    }

    #[test]
    fn test_response_prefers_tool_response() {
        let json = r#"{"tool_response": "new", "tool_result": "old"}"#;
        let input = HookInput::parse(json).unwrap();
        assert_eq!(input.response(), Some(&json!("new")));

        let json = r#"{"tool_result": "old"}"#;
        let input = HookInput::parse(json).unwrap();
        assert_eq!(input.response_text(), "old");
    }

    #[test]
    fn test_response_text_joins_content_blocks() {
        let json = r#"{"tool_response": [{"type":"text","text":"one"},{"type":"text","text":"two"}]}"#;
        let input = HookInput::parse(json).unwrap();
        assert_eq!(input.response_text(), "one\ntwo");

        let json = r#"{"tool_response": {"content": [{"type":"text","text":"inner"}]}}"#;
        let input = HookInput::parse(json).unwrap();
        assert_eq!(input.response_text(), "inner");
    }

    #[test]
    fn test_prompt_falls_back_to_message() {
        let input = HookInput::parse(r#"{"message": "hello"}"#).unwrap();
        assert_eq!(input.prompt_text(), Some("hello"));

        let input = HookInput::parse(r#"{"prompt": "   "}"#).unwrap();
        assert_eq!(input.prompt_text(), None);
    }

    #[test]
    fn test_serialize_round_trip_keeps_only_present_fields() {
        let raw = json!({"session_id": "s1", "model": {"display_name": "Opus"}});
        let input = HookInput::parse(&raw.to_string()).unwrap();
        assert_eq!(serde_json::to_value(&input).unwrap(), raw);
    }

    #[test]
    fn test_empty_session_id_is_none() {
        let input = HookInput::parse(r#"{"session_id": ""}"#).unwrap();
        assert!(input.session_id().is_none());
    }
}
