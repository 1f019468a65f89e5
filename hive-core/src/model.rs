//! The Model protocol — a live connection to an LLM provider.
//!
//! These are the internal lingua franca between agents and provider
//! connections. Provider adapters convert to and from their wire formats.

use crate::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a turn in a model conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Input from anyone other than the agent itself.
    User,
    /// Output previously produced by the agent.
    Assistant,
    /// Result of a tool invocation.
    Tool,
}

/// One turn of the conversation sent to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who the turn belongs to.
    pub role: Role,
    /// Originating participant, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The text of the turn.
    pub content: String,
    /// Tool calls requested in an assistant turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// The call a tool turn answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatTurn {
    /// Create a turn.
    pub fn new(role: Role, name: Option<String>, content: impl Into<String>) -> Self {
        Self {
            role,
            name,
            content: content.into(),
            tool_calls: vec![],
            tool_call_id: None,
        }
    }

    /// An assistant turn that requested tool calls.
    pub fn tool_request(name: Option<String>, text: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::new(Role::Assistant, name, text)
        }
    }

    /// The result of one tool call.
    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call.id.clone()),
            ..Self::new(Role::Tool, Some(call.name.clone()), content)
        }
    }
}

/// JSON Schema description of a tool offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input.
    pub input_schema: serde_json::Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned identifier of this call.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Tool input.
    pub input: serde_json::Value,
}

/// Request sent to a model connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Conversation turns, oldest first.
    pub messages: Vec<ChatTurn>,
    /// Tools the model may call.
    #[serde(default)]
    pub tools: Vec<ToolSchema>,
    /// Provider-specific passthrough.
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Token accounting for one completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Input tokens consumed.
    pub input_tokens: u64,
    /// Output tokens generated.
    pub output_tokens: u64,
}

/// What a model returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Final text. Empty when the model only requested tool calls.
    pub text: String,
    /// Reasoning the provider chose to expose.
    #[serde(default)]
    pub thought: Option<String>,
    /// Tool calls the model wants executed before answering.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Token accounting.
    #[serde(default)]
    pub usage: Usage,
}

impl Completion {
    /// A plain text completion.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// A completion that only requests tool calls.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::default()
        }
    }
}

/// A live, shareable connection to an LLM provider.
///
/// Connections are expensive: the component factory builds one per
/// resource key and hands the same connection to every agent that needs
/// it. Implementations must tolerate concurrent `complete` calls.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Provider identifier this connection was built for.
    fn provider(&self) -> &str;

    /// Model identifier this connection was built for.
    fn model(&self) -> &str;

    /// Send a completion request.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError>;

    /// Tear the connection down. Called once, by the owning factory.
    async fn close(&self) -> Result<(), ModelError>;
}
