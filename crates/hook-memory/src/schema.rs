//! Memory service schema.
//!
//! The memory service is reached through host tools; hooks only see the tool
//! name, its input and whatever the host hands back as the result. Results
//! arrive as an object, a JSON string, or a list of text content blocks
//! wrapping a JSON string. [`ServiceResponse::normalize`] is the one place
//! that knows those shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Server prefix of the memory tools.
pub const TOOL_PREFIX: &str = "mcp__gutt-mcp-remote__";

/// Memory tools the hooks react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryTool {
    AddMemory,
    SearchMemoryFacts,
    FetchLessonsLearned,
}

impl MemoryTool {
    pub const ALL: [MemoryTool; 3] = [
        MemoryTool::AddMemory,
        MemoryTool::SearchMemoryFacts,
        MemoryTool::FetchLessonsLearned,
    ];

    /// Look up a tool by its full host name.
    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.tool_name() == name)
    }

    /// Full host tool name.
    pub fn tool_name(self) -> &'static str {
        match self {
            MemoryTool::AddMemory => "mcp__gutt-mcp-remote__add_memory",
            MemoryTool::SearchMemoryFacts => "mcp__gutt-mcp-remote__search_memory_facts",
            MemoryTool::FetchLessonsLearned => "mcp__gutt-mcp-remote__fetch_lessons_learned",
        }
    }

    /// Searches count as memory queries; adds count as captured lessons.
    pub fn is_query(self) -> bool {
        !matches!(self, MemoryTool::AddMemory)
    }

    /// Query label used when the tool input has none.
    pub fn default_query(self) -> &'static str {
        match self {
            MemoryTool::AddMemory => "memory",
            MemoryTool::SearchMemoryFacts => "query",
            MemoryTool::FetchLessonsLearned => "lessons",
        }
    }
}

/// A lesson as cached and shown to agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRecord {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

impl LessonRecord {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            guidance: None,
            outcome: None,
        }
    }

    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = Some(guidance.into());
        self
    }

    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }
}

/// A fact as cached and shown to agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRecord {
    pub fact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FactRecord {
    pub fn new(fact: impl Into<String>) -> Self {
        Self {
            fact: fact.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Why a response could not be normalized.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response text is not JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("memory service reported an error: {0}")]
    Service(String),

    #[error("unrecognized response shape")]
    UnrecognizedShape,
}

/// A memory-service response in one of its known forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceResponse {
    Facts(Vec<FactRecord>),
    Lessons(Vec<LessonRecord>),
    Message(String),
}

impl ServiceResponse {
    /// Normalize a raw tool result.
    pub fn normalize(raw: &Value) -> Result<Self, ResponseError> {
        let doc = unwrap_envelope(raw)?;

        if let Some(error) = doc.get("error").filter(|e| !e.is_null()) {
            let message = error
                .as_str()
                .map(str::to_string)
                .or_else(|| error.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| error.to_string());
            return Err(ResponseError::Service(message));
        }

        let payload = doc.get("result").ok_or(ResponseError::UnrecognizedShape)?;

        if let Some(facts) = payload.get("facts").and_then(Value::as_array) {
            return Ok(ServiceResponse::Facts(facts.iter().filter_map(parse_fact).collect()));
        }
        if let Some(lessons) = payload.get("lessons").and_then(Value::as_array) {
            return Ok(ServiceResponse::Lessons(
                lessons.iter().filter_map(parse_lesson).collect(),
            ));
        }
        if let Some(message) = payload.get("message").and_then(Value::as_str) {
            return Ok(ServiceResponse::Message(message.to_string()));
        }
        if let Some(message) = payload.as_str() {
            return Ok(ServiceResponse::Message(message.to_string()));
        }

        Err(ResponseError::UnrecognizedShape)
    }

    /// Text of the first result, for the ticker.
    pub fn first_result(&self) -> Option<&str> {
        match self {
            ServiceResponse::Facts(facts) => facts.first().map(|f| f.fact.as_str()),
            ServiceResponse::Lessons(lessons) => lessons.first().map(|l| l.summary.as_str()),
            ServiceResponse::Message(message) => Some(message.as_str()),
        }
    }
}

/// Strip transport wrapping: JSON strings and text content blocks.
fn unwrap_envelope(raw: &Value) -> Result<Value, ResponseError> {
    match raw {
        Value::String(text) => Ok(serde_json::from_str(text)?),
        Value::Array(blocks) => first_block_text(blocks)
            .map(|text| serde_json::from_str(text).map_err(ResponseError::from))
            .unwrap_or(Err(ResponseError::UnrecognizedShape)),
        Value::Object(obj) if !obj.contains_key("result") => match obj.get("content") {
            Some(Value::Array(blocks)) => first_block_text(blocks)
                .map(|text| serde_json::from_str(text).map_err(ResponseError::from))
                .unwrap_or(Err(ResponseError::UnrecognizedShape)),
            _ => Ok(raw.clone()),
        },
        Value::Object(_) => Ok(raw.clone()),
        _ => Err(ResponseError::UnrecognizedShape),
    }
}

fn first_block_text(blocks: &[Value]) -> Option<&str> {
    blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .find_map(|block| block.get("text").and_then(Value::as_str))
}

fn parse_fact(value: &Value) -> Option<FactRecord> {
    let fact = value.get("fact").and_then(Value::as_str)?;
    Some(FactRecord {
        fact: fact.to_string(),
        name: optional_str(value, "name"),
    })
}

fn parse_lesson(value: &Value) -> Option<LessonRecord> {
    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .or_else(|| value.get("lesson").and_then(Value::as_str))?;
    Some(LessonRecord {
        summary: summary.to_string(),
        guidance: optional_str(value, "guidance"),
        outcome: optional_str(value, "outcome"),
    })
}

fn optional_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_lookup() {
        assert_eq!(
            MemoryTool::from_tool_name("mcp__gutt-mcp-remote__add_memory"),
            Some(MemoryTool::AddMemory)
        );
        assert_eq!(MemoryTool::from_tool_name("Task"), None);
        assert!(MemoryTool::SearchMemoryFacts.is_query());
        assert!(!MemoryTool::AddMemory.is_query());
        for tool in MemoryTool::ALL {
            assert!(tool.tool_name().starts_with(TOOL_PREFIX));
        }
    }

    #[test]
    fn test_normalize_facts_object() {
        let raw = json!({"result": {"facts": [{"fact": "Uses tokio", "name": "runtime"}, {"nofact": 1}]}});
        let response = ServiceResponse::normalize(&raw).unwrap();
        assert_eq!(
            response,
            ServiceResponse::Facts(vec![FactRecord::new("Uses tokio").with_name("runtime")])
        );
        assert_eq!(response.first_result(), Some("Uses tokio"));
    }

    #[test]
    fn test_normalize_lessons_from_json_string() {
        let raw = json!(r#"{"result":{"lessons":[{"lesson":"Pin versions","outcome":"success"},{"summary":"Retry","guidance":"Back off"}]}}"#);
        let response = ServiceResponse::normalize(&raw).unwrap();
        assert_eq!(
            response,
            ServiceResponse::Lessons(vec![
                LessonRecord::new("Pin versions").with_outcome("success"),
                LessonRecord::new("Retry").with_guidance("Back off"),
            ])
        );
    }

    #[test]
    fn test_normalize_content_blocks() {
        let raw = json!([{"type": "text", "text": "{\"result\":{\"message\":\"Episode queued\"}}"}]);
        let response = ServiceResponse::normalize(&raw).unwrap();
        assert_eq!(response, ServiceResponse::Message("Episode queued".to_string()));

        let wrapped = json!({"content": [{"type": "text", "text": "{\"result\":{\"facts\":[]}}"}]});
        assert_eq!(
            ServiceResponse::normalize(&wrapped).unwrap(),
            ServiceResponse::Facts(vec![])
        );
    }

    #[test]
    fn test_normalize_errors() {
        assert!(matches!(
            ServiceResponse::normalize(&json!("not json")),
            Err(ResponseError::InvalidJson(_))
        ));
        assert!(matches!(
            ServiceResponse::normalize(&json!({"something": "else"})),
            Err(ResponseError::UnrecognizedShape)
        ));
        assert!(matches!(
            ServiceResponse::normalize(&json!(42)),
            Err(ResponseError::UnrecognizedShape)
        ));

        let err = ServiceResponse::normalize(&json!({"error": {"message": "unauthorized"}})).unwrap_err();
        assert_eq!(err.to_string(), "memory service reported an error: unauthorized");
    }

    #[test]
    fn test_empty_facts_have_no_first_result() {
        assert_eq!(ServiceResponse::Facts(vec![]).first_result(), None);
    }
}
