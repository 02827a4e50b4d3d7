//! Hook output generation for stdout.

use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Host event a context directive answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookEvent {
    SessionStart,
    UserPromptSubmit,
    PreToolUse,
    PostToolUse,
    SubagentStart,
    SubagentStop,
    Stop,
}

/// Blocking decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Stop the transition and feed `reason` back to the agent
    Block,
}

/// Hook-specific output structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    /// Hook event name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_event_name: Option<HookEvent>,

    /// Context injected into the agent
    pub additional_context: String,
}

/// Structured directive printed as one JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HookOutput {
    /// `{"decision":"block","reason":...}`, CLI only
    Block { decision: Decision, reason: String },
    /// `{"hookSpecificOutput":{...}}`, portable
    Context {
        #[serde(rename = "hookSpecificOutput")]
        hook_specific_output: HookSpecificOutput,
    },
}

impl HookOutput {
    /// Block with a reason.
    pub fn block(reason: impl Into<String>) -> Self {
        Self::Block {
            decision: Decision::Block,
            reason: reason.into(),
        }
    }

    /// Inject context without naming the event.
    pub fn context(context: impl Into<String>) -> Self {
        Self::Context {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: None,
                additional_context: context.into(),
            },
        }
    }

    /// Set the event name on a context directive.
    pub fn with_event(mut self, event: HookEvent) -> Self {
        if let Self::Context {
            hook_specific_output,
        } = &mut self
        {
            hook_specific_output.hook_event_name = Some(event);
        }
        self
    }

    /// Block on CLI; on Cowork, inject `cowork_context` instead.
    pub fn for_platform(
        platform: Platform,
        reason: impl Into<String>,
        cowork_context: impl Into<String>,
    ) -> Self {
        if platform.supports_decision_block() {
            Self::block(reason)
        } else {
            Self::context(cowork_context)
        }
    }

    /// True for the blocking form.
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    /// Text carried by the directive (reason or context).
    pub fn text(&self) -> &str {
        match self {
            Self::Block { reason, .. } => reason,
            Self::Context {
                hook_specific_output,
            } => &hook_specific_output.additional_context,
        }
    }

    /// Write the output to stdout.
    pub fn write_stdout(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string(self)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", json)?;
        stdout.flush()?;
        Ok(())
    }
}

/// What a hook handler wants printed.
#[derive(Debug, Clone, PartialEq)]
pub enum HookResponse {
    /// Print nothing
    Silent,
    /// Plain advisory text
    Text(String),
    /// One JSON directive
    Output(HookOutput),
}

impl HookResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Print the response.
    pub fn write_stdout(&self) -> anyhow::Result<()> {
        match self {
            Self::Silent => Ok(()),
            Self::Text(text) => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", text)?;
                stdout.flush()?;
                Ok(())
            }
            Self::Output(output) => output.write_stdout(),
        }
    }
}

impl From<HookOutput> for HookResponse {
    fn from(output: HookOutput) -> Self {
        Self::Output(output)
    }
}
