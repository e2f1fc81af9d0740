//! Conversation and model exchange models.
//!
//! These types are provider-neutral: every `ChatModel` adapter maps them onto
//! its own wire format.

use serde::{Deserialize, Serialize};

use super::session::SessionContext;
use super::tool::ToolSpec;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back with the observation
    pub id: String,
    /// Tool name as advertised to the model
    pub name: String,
    /// JSON arguments chosen by the model
    pub arguments: serde_json::Value,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatMessage {
    /// Message written by the user
    User {
        /// Text typed by the user
        content: String,
    },
    /// Model output, possibly requesting tool calls
    Assistant {
        /// Text of the reply, possibly empty
        content: String,
        /// Tool calls requested in this reply
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Observation of a tool call, fed back to the model
    ToolResult {
        /// Id of the tool call this answers
        call_id: String,
        /// Observation text
        content: String,
        /// Whether the observation describes a failure
        is_error: bool,
    },
}

impl ChatMessage {
    /// User message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Assistant message without tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// State of a user conversation handed to the supervisor.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// Who is talking, used for scoping and placeholders
    pub session: SessionContext,
    /// Turns so far, oldest first
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Empty conversation for `session`.
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            messages: Vec::new(),
        }
    }

    /// Start a conversation with a single user message.
    pub fn with_user_message(session: SessionContext, content: impl Into<String>) -> Self {
        Self {
            session,
            messages: vec![ChatMessage::user(content)],
        }
    }

    /// Append a message.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Text of the most recent user message.
    pub fn latest_user_message(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            ChatMessage::User { content } => Some(content.as_str()),
            _ => None,
        })
    }

    /// True until the assistant has replied at least once.
    pub fn is_first_contact(&self) -> bool {
        !self
            .messages
            .iter()
            .any(|m| matches!(m, ChatMessage::Assistant { .. }))
    }
}

/// Request sent to a chat model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Resolved system prompt
    pub system: String,
    /// Conversation turns, oldest first
    pub messages: Vec<ChatMessage>,
    /// Tools the model may call; empty for plain completions
    pub tools: Vec<ToolSpec>,
    /// Overrides the provider's default reply length
    pub max_tokens: Option<u32>,
    /// Overrides the provider's default temperature
    pub temperature: Option<f32>,
}

impl ModelRequest {
    /// Request without tools or sampling overrides.
    pub fn new(system: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            system: system.into(),
            messages,
            tools: Vec::new(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Advertise `tools` to the model.
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }
}

/// Reason a model reply ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model finished its answer
    EndTurn,
    /// The model is waiting for tool results
    ToolUse,
    /// The reply was cut at `max_tokens`
    MaxTokens,
    /// Provider-specific reason
    Other(String),
}

impl StopReason {
    /// Map a provider's stop reason string.
    pub fn from_provider(reason: Option<&str>) -> Self {
        match reason {
            Some("end_turn" | "stop" | "stop_sequence") | None => Self::EndTurn,
            Some("tool_use" | "tool_calls") => Self::ToolUse,
            Some("max_tokens" | "length") => Self::MaxTokens,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens sent to the model
    pub input_tokens: u64,
    /// Tokens generated by the model
    pub output_tokens: u64,
}

/// A model reply: either final text or a request to call tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    /// Final text, possibly empty when tools were requested
    pub content: String,
    /// Tool calls requested by the model, in order
    pub tool_calls: Vec<ToolCall>,
    /// Why the model stopped
    pub stop_reason: StopReason,
    /// Token accounting, when the provider reports it
    pub usage: Option<TokenUsage>,
}

impl ModelReply {
    /// Final text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
            usage: None,
        }
    }

    /// Reply requesting a single tool call.
    pub fn tool_call(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        let name = name.into();
        Self {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                name,
                arguments,
            }],
            stop_reason: StopReason::ToolUse,
            usage: None,
        }
    }

    /// Whether the model is waiting on tool results.
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_user_message_and_first_contact() {
        let mut conversation =
            Conversation::with_user_message(SessionContext::default(), "oi");
        assert!(conversation.is_first_contact());
        assert_eq!(conversation.latest_user_message(), Some("oi"));

        conversation.push(ChatMessage::assistant("Olá!"));
        conversation.push(ChatMessage::user("cadastrar cliente"));
        assert!(!conversation.is_first_contact());
        assert_eq!(conversation.latest_user_message(), Some("cadastrar cliente"));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(StopReason::from_provider(Some("tool_use")), StopReason::ToolUse);
        assert_eq!(StopReason::from_provider(Some("length")), StopReason::MaxTokens);
        assert_eq!(StopReason::from_provider(None), StopReason::EndTurn);
    }

    #[test]
    fn test_message_serde_tagging() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");
    }
}
