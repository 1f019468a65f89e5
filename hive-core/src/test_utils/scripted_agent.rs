//! ScriptedAgent — fixed replies, recorded inputs, optional latency.

use crate::agent::Agent;
use crate::error::AgentError;
use crate::message::{Message, MessageKind};
use crate::response::Response;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// An agent that answers with a fixed reply and records every context it
/// was given. Use `.seen()` to inspect what the agent observed.
pub struct ScriptedAgent {
    name: String,
    reply: String,
    kind: MessageKind,
    inner: Vec<Message>,
    delay: Option<Duration>,
    seen: Mutex<Vec<Vec<Message>>>,
    calls: AtomicUsize,
    resets: AtomicUsize,
}

impl ScriptedAgent {
    /// Create an agent that always replies `reply`.
    pub fn new(name: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: reply.into(),
            kind: MessageKind::Text,
            inner: vec![],
            delay: None,
            seen: Mutex::new(vec![]),
            calls: AtomicUsize::new(0),
            resets: AtomicUsize::new(0),
        }
    }

    /// Reply with a terminal stop message instead of text.
    pub fn stopping(mut self) -> Self {
        self.kind = MessageKind::Stop;
        self
    }

    /// Emit a thought before the reply.
    pub fn with_thought(mut self, thought: impl Into<String>) -> Self {
        self.inner.push(Message::thought(&self.name, thought));
        self
    }

    /// Wait this long before replying. The wait observes cancellation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every context this agent was invoked with, oldest first.
    pub fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }

    /// Number of invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of resets so far.
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(
        &self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<Response, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(messages);
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(AgentError::Cancelled { trace: vec![] });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
        let reply = Message::new(&self.name, &self.reply, self.kind.clone());
        Ok(Response::new(reply).with_inner(self.inner.clone()))
    }

    async fn reset(&self) -> Result<(), AgentError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
