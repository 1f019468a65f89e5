//! Shared plumbing: agent identity, context conversion, cancellable calls.

use hive_core::{
    AgentError, CancellationToken, ChatTurn, Completion, CompletionRequest, Message, MessageKind,
    ModelHandle, Role,
};
use hive_factory::AgentInit;

/// System prompt used when a configuration has no `instructions`.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant.";

/// Name, description and instructions of a configured agent.
#[derive(Debug, Clone)]
pub(crate) struct Profile {
    pub name: String,
    pub description: String,
    pub instructions: String,
}

impl Profile {
    pub fn from_init(init: &AgentInit) -> Self {
        Self {
            name: init.name.clone(),
            description: init.config.description.clone().unwrap_or_default(),
            instructions: init
                .config
                .instructions
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_owned()),
        }
    }
}

/// Convert visible context into model turns.
///
/// The agent's own messages become assistant turns; everything else is a
/// user turn carrying its source. Thoughts and events are bookkeeping and
/// are not replayed to the model.
pub(crate) fn to_chat_turns(agent: &str, messages: &[Message]) -> Vec<ChatTurn> {
    messages
        .iter()
        .filter(|m| !matches!(m.kind, MessageKind::Thought | MessageKind::Event))
        .map(|m| {
            let role = if m.source == agent {
                Role::Assistant
            } else {
                Role::User
            };
            ChatTurn::new(role, Some(m.source.clone()), m.content.clone())
        })
        .collect()
}

/// Content of the latest message the model would see.
pub(crate) fn latest_content(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| !matches!(m.kind, MessageKind::Thought | MessageKind::Event))
        .map(|m| m.content.as_str())
}

/// Send `request`, giving up as soon as `cancel` fires.
pub(crate) async fn complete(
    client: &ModelHandle,
    request: CompletionRequest,
    cancel: &CancellationToken,
) -> Result<Completion, AgentError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AgentError::Cancelled { trace: vec![] }),
        result = client.complete(request) => Ok(result?),
    }
}
