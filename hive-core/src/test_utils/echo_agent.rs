//! EchoAgent — answers with the content of the last message it saw.

use crate::agent::Agent;
use crate::error::AgentError;
use crate::message::Message;
use crate::response::Response;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// An agent that repeats the last message of its context under its own name.
pub struct EchoAgent {
    name: String,
}

impl EchoAgent {
    /// Create a new echo agent.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Agent for EchoAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(
        &self,
        messages: Vec<Message>,
        _cancel: CancellationToken,
    ) -> Result<Response, AgentError> {
        let content = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(Response::new(Message::text(&self.name, content)))
    }
}
