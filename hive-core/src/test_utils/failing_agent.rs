//! FailingAgent — always fails.

use crate::agent::Agent;
use crate::error::{AgentError, ModelError};
use crate::message::Message;
use crate::response::Response;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// An agent whose every invocation fails with a model error.
pub struct FailingAgent {
    name: String,
    reason: String,
}

impl FailingAgent {
    /// Create a failing agent with the given failure reason.
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Agent for FailingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(
        &self,
        _messages: Vec<Message>,
        _cancel: CancellationToken,
    ) -> Result<Response, AgentError> {
        Err(AgentError::Model(ModelError::RequestFailed(self.reason.clone())))
    }
}
