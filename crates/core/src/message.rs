//! Message, session and transcript value objects.
//!
//! User types a message → intent is classified → memory or agent acts → a reply
//! is appended to the session transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    /// Tool execution result fed back to the model
    Tool,
}

/// A single message sent to or received from a language model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a tool result message answering `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageToolCall {
    pub id: String,
    pub name: String,
    /// Arguments as a JSON string, exactly as the model produced them
    pub arguments: String,
}

/// The user-visible side of a session: user inputs and assistant replies.
///
/// Tool traffic and system prompts are never recorded here; the agent runtime
/// keeps those for the duration of one turn only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transcript {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a user/assistant exchange.
    pub fn record_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(Message::user(user));
        self.messages.push(Message::assistant(assistant));
        self.updated_at = Utc::now();
    }

    /// The last `turns` exchanges, oldest first.
    pub fn recent(&self, turns: usize) -> &[Message] {
        let keep = turns.saturating_mul(2).min(self.messages.len());
        &self.messages[self.messages.len() - keep..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Order 200 bags of cement");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Order 200 bags of cement");
        assert!(msg.tool_calls.is_empty());
        assert!(msg.tool_call_id.is_none());
    }

    #[test]
    fn tool_result_links_call_id() {
        let msg = Message::tool_result("call_7", "[]");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
    }

    #[test]
    fn transcript_records_both_sides() {
        let mut transcript = Transcript::new();
        let created = transcript.created_at;
        transcript.record_turn("hello", "Hi! What do you need to buy?");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages[0].role, Role::User);
        assert_eq!(transcript.messages[1].role, Role::Assistant);
        assert!(transcript.updated_at >= created);
    }

    #[test]
    fn recent_keeps_latest_turns() {
        let mut transcript = Transcript::new();
        transcript.record_turn("Mumbai limit is 50000", "Learned: Mumbai limit is 50000");
        transcript.record_turn("Buy cement", "Proceed? (y/n)");
        transcript.record_turn("y", "Order placed with UltraTech.");

        let recent = transcript.recent(2);
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].content, "Buy cement");
        assert_eq!(recent[3].content, "Order placed with UltraTech.");

        assert_eq!(transcript.recent(10).len(), 6);
        assert!(transcript.recent(0).is_empty());
        assert!(Transcript::new().recent(3).is_empty());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
