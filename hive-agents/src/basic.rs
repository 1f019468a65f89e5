//! Basic agent: one model call, no tools.

use crate::prompt::{Profile, complete, to_chat_turns};
use async_trait::async_trait;
use hive_core::{
    Agent, AgentError, CancellationToken, CompletionRequest, Message, ModelHandle, Response,
};
use hive_factory::{AgentInit, AgentKind};

/// A model-backed agent that answers with a single completion.
///
/// The configured `instructions` are the system prompt. A reasoning trace
/// exposed by the provider becomes an inner thought message.
pub struct BasicAgent {
    profile: Profile,
    client: ModelHandle,
}

impl BasicAgent {
    /// The model connection this agent uses.
    pub fn client(&self) -> &ModelHandle {
        &self.client
    }

    /// The system prompt.
    pub fn instructions(&self) -> &str {
        &self.profile.instructions
    }
}

#[async_trait]
impl Agent for BasicAgent {
    fn name(&self) -> &str {
        &self.profile.name
    }

    fn description(&self) -> &str {
        &self.profile.description
    }

    async fn respond(
        &self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<Response, AgentError> {
        let name = &self.profile.name;
        let request = CompletionRequest {
            system: Some(self.profile.instructions.clone()),
            messages: to_chat_turns(name, &messages),
            ..CompletionRequest::default()
        };
        tracing::debug!(agent = %name, turns = request.messages.len(), "hive.agent.complete");
        let completion = complete(&self.client, request, &cancel).await?;

        let inner = completion
            .thought
            .map(|thought| vec![Message::thought(name.clone(), thought)])
            .unwrap_or_default();
        Ok(Response::new(Message::text(name.clone(), completion.text)).with_inner(inner))
    }
}

impl AgentKind for BasicAgent {
    fn initialize(init: AgentInit) -> Result<Self, AgentError> {
        Ok(Self {
            profile: Profile::from_init(&init),
            client: init.client,
        })
    }
}
