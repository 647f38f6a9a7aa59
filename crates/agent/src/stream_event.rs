//! Agent-level events.
//!
//! One agent run produces an ordered list of [`AgentEvent`]s. The
//! orchestrator reads the text out of it to find the decision block, and
//! the CLI renders the tool traffic as the reasoning trace.

use serde::{Deserialize, Serialize};

/// Events emitted by the agent runtime during one run.
///
/// - `text_delta`: text the model produced alongside tool calls
/// - `tool_call`: the model asked for a tool
/// - `tool_result`: a tool answered (or was refused)
/// - `final`: the model's closing answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Intermediate model text.
    TextDelta { content: String },

    /// The agent is calling a tool.
    ToolCall {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Tool execution completed.
    ToolResult {
        id: String,
        name: String,
        output: String,
        success: bool,
    },

    /// The final answer of the run.
    Final { content: String },
}

impl AgentEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TextDelta { .. } => "text_delta",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Final { .. } => "final",
        }
    }

    /// Text this event contributes to the agent's answer, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::TextDelta { content } | Self::Final { content } => Some(content),
            Self::ToolCall { .. } | Self::ToolResult { .. } => None,
        }
    }
}

/// Concatenate the text of `events` in order. Tool events contribute nothing.
///
/// Pieces are separated by a newline so that text from separate model
/// responses never runs together.
pub fn collect_text(events: &[AgentEvent]) -> String {
    events
        .iter()
        .filter_map(AgentEvent::text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
