//! Hosted assistant agent.

use crate::prompt::{Profile, complete, to_chat_turns};
use async_trait::async_trait;
use hive_core::{
    Agent, AgentError, CancellationToken, ChatTurn, CompletionRequest, Message, ModelHandle,
    Response, Role,
};
use hive_factory::{AgentInit, AgentKind};
use serde_json::json;
use tokio::sync::Mutex;

/// An agent backed by a provider-hosted assistant.
///
/// With an `assistant_id` the existing assistant is used as is, and
/// `instructions` are ignored. Without one, the provider creates an
/// assistant from `instructions`. Either travels in the request's `extra`
/// together with the model name, since hosted assistants share one client
/// per provider.
///
/// The assistant keeps a conversation thread across invocations; only new
/// context is appended to it. [`Agent::reset`] starts a fresh thread.
pub struct AssistantAgent {
    profile: Profile,
    client: ModelHandle,
    model: String,
    assistant_id: Option<String>,
    thread: Mutex<Vec<ChatTurn>>,
}

impl AssistantAgent {
    /// Identifier of the hosted assistant, when one was configured.
    pub fn assistant_id(&self) -> Option<&str> {
        self.assistant_id.as_deref()
    }

    /// Number of turns in the current thread.
    pub async fn thread_len(&self) -> usize {
        self.thread.lock().await.len()
    }

    fn extra(&self) -> serde_json::Value {
        match &self.assistant_id {
            Some(id) => json!({"model": self.model, "assistant_id": id}),
            None => json!({"model": self.model, "instructions": self.profile.instructions}),
        }
    }
}

#[async_trait]
impl Agent for AssistantAgent {
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
        let mut thread = self.thread.lock().await;
        let incoming: Vec<ChatTurn> = to_chat_turns(name, &messages)
            .into_iter()
            .filter(|turn| turn.role != Role::Assistant)
            .collect();

        let mut turns = thread.clone();
        turns.extend(incoming.iter().cloned());
        let request = CompletionRequest {
            system: None,
            messages: turns,
            extra: self.extra(),
            ..CompletionRequest::default()
        };
        let completion = complete(&self.client, request, &cancel).await?;

        thread.extend(incoming);
        thread.push(ChatTurn::new(
            Role::Assistant,
            Some(name.clone()),
            completion.text.clone(),
        ));

        let inner = completion
            .thought
            .map(|thought| vec![Message::thought(name.clone(), thought)])
            .unwrap_or_default();
        Ok(Response::new(Message::text(name.clone(), completion.text)).with_inner(inner))
    }

    async fn reset(&self) -> Result<(), AgentError> {
        self.thread.lock().await.clear();
        Ok(())
    }
}

impl AgentKind for AssistantAgent {
    fn initialize(init: AgentInit) -> Result<Self, AgentError> {
        let assistant_id = init.config.assistant_id.clone();
        if assistant_id.is_some() && init.config.instructions.is_some() {
            tracing::warn!(
                agent = %init.name,
                ignored = "instructions",
                "hive.agent.assistant_params_ignored"
            );
        }
        Ok(Self {
            profile: Profile::from_init(&init),
            model: init.config.llm_config.model.clone(),
            client: init.client,
            assistant_id,
            thread: Mutex::new(Vec::new()),
        })
    }
}
