//! Retrieval-augmented agent.

use crate::prompt::{Profile, complete, latest_content, to_chat_turns};
use async_trait::async_trait;
use hive_core::{
    Agent, AgentError, CancellationToken, CompletionRequest, MemoryHandle, MemoryResult, Message,
    ModelHandle, Response,
};
use hive_factory::{AgentInit, AgentKind};

const MEMORY_HEADER: &str = "Relevant memory content (in chronological order):";

/// A model-backed agent that consults its attached memory first.
///
/// Every attached memory is queried with the latest context message. When
/// anything is found, the agent emits an event message listing it and
/// appends the results to the system prompt as a numbered list.
pub struct RetrievalAgent {
    profile: Profile,
    client: ModelHandle,
    memory: Vec<MemoryHandle>,
}

impl RetrievalAgent {
    /// Memory resources this agent consults.
    pub fn memory(&self) -> &[MemoryHandle] {
        &self.memory
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<MemoryResult>, AgentError> {
        let mut results = Vec::new();
        for memory in &self.memory {
            results.extend(memory.query(query).await?);
        }
        Ok(results)
    }
}

fn augment(instructions: &str, results: &[MemoryResult]) -> String {
    let mut system = format!("{instructions}\n\n{MEMORY_HEADER}\n");
    for (i, result) in results.iter().enumerate() {
        system.push_str(&format!("{}. {}\n", i + 1, result.content));
    }
    system
}

#[async_trait]
impl Agent for RetrievalAgent {
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
        let results = match latest_content(&messages) {
            Some(query) if !self.memory.is_empty() => self.retrieve(query).await?,
            _ => Vec::new(),
        };
        tracing::debug!(agent = %name, results = results.len(), "hive.agent.retrieved");

        let mut inner = Vec::new();
        let system = if results.is_empty() {
            self.profile.instructions.clone()
        } else {
            let listing: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
            inner.push(Message::event(name.clone(), listing.join("\n")));
            augment(&self.profile.instructions, &results)
        };

        let request = CompletionRequest {
            system: Some(system),
            messages: to_chat_turns(name, &messages),
            ..CompletionRequest::default()
        };
        let completion = complete(&self.client, request, &cancel).await?;
        if let Some(thought) = completion.thought {
            inner.push(Message::thought(name.clone(), thought));
        }
        Ok(Response::new(Message::text(name.clone(), completion.text)).with_inner(inner))
    }
}

impl AgentKind for RetrievalAgent {
    fn initialize(init: AgentInit) -> Result<Self, AgentError> {
        Ok(Self {
            profile: Profile::from_init(&init),
            client: init.client,
            memory: init.memory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock_init;
    use hive_core::test_utils::MockModel;
    use hive_core::{Handle, Memory, MessageKind, ResourceKey};
    use hive_memory::ListMemory;
    use serde_json::json;
    use std::sync::Arc;

    async fn notes(entries: &[&str]) -> MemoryHandle {
        let memory = ListMemory::new("notes");
        for entry in entries {
            memory.add((*entry).to_owned(), json!(null)).await.unwrap();
        }
        let memory: Arc<dyn Memory> = Arc::new(memory);
        Handle::new(ResourceKey::memory("notes"), memory)
    }

    #[tokio::test]
    async fn retrieved_content_reaches_the_system_prompt() {
        let model = Arc::new(MockModel::new("openai", "gpt-4o"));
        let mut init = mock_init("rag", Arc::clone(&model));
        init.memory = vec![notes(&["The user likes haiku.", "The user lives in Oslo."]).await];
        let agent = RetrievalAgent::initialize(init).unwrap();

        let response = agent
            .respond(vec![Message::user("write me a poem")], CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.inner_messages.len(), 1);
        assert_eq!(response.inner_messages[0].kind, MessageKind::Event);
        assert!(response.inner_messages[0].content.contains("haiku"));

        let system = model.requests()[0].system.clone().unwrap();
        assert!(system.starts_with("You are a helpful assistant."));
        assert!(system.contains(MEMORY_HEADER));
        assert!(system.contains("1. The user likes haiku."));
        assert!(system.contains("2. The user lives in Oslo."));
    }

    #[tokio::test]
    async fn without_results_behaves_like_a_basic_agent() {
        let model = Arc::new(MockModel::new("openai", "gpt-4o"));
        let mut init = mock_init("rag", Arc::clone(&model));
        init.memory = vec![notes(&[]).await];
        let agent = RetrievalAgent::initialize(init).unwrap();

        let response = agent
            .respond(vec![Message::user("hello")], CancellationToken::new())
            .await
            .unwrap();
        assert!(response.inner_messages.is_empty());
        assert_eq!(
            model.requests()[0].system.as_deref(),
            Some("You are a helpful assistant.")
        );
    }

    #[tokio::test]
    async fn closed_memory_fails_the_response() {
        let model = Arc::new(MockModel::new("openai", "gpt-4o"));
        let handle = notes(&["x"]).await;
        handle.close().await.unwrap();
        let mut init = mock_init("rag", Arc::clone(&model));
        init.memory = vec![handle];
        let agent = RetrievalAgent::initialize(init).unwrap();

        let err = agent
            .respond(vec![Message::user("hello")], CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Memory(_)));
        assert!(model.requests().is_empty());
    }
}
