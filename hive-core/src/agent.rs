//! The Agent protocol — a named participant that responds to a context.

use crate::error::AgentError;
use crate::message::Message;
use crate::response::{Event, EventStream, Response};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A named, schedulable participant.
///
/// An agent receives the messages it is allowed to see and answers with a
/// [`Response`]. Model-backed agents, tool-using agents and whole pipelines
/// all implement this one trait, which is what lets a pipeline sit inside
/// another pipeline as a single node.
///
/// Agents are immutable once constructed. Reconfiguring means building a
/// new instance.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique name of this participant within a workflow.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str {
        ""
    }

    /// Respond to `messages`. Implementations check `cancel` at every
    /// suspension point they control.
    async fn respond(
        &self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<Response, AgentError>;

    /// Respond incrementally.
    ///
    /// The default runs [`Agent::respond`] and replays its inner messages
    /// before the final response. Agents that can surface progress while
    /// working override this.
    fn respond_stream<'a>(
        &'a self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> EventStream<'a> {
        Box::pin(async_stream::try_stream! {
            let response = self.respond(messages, cancel).await?;
            for message in &response.inner_messages {
                yield Event::Message(message.clone());
            }
            yield Event::Response(response);
        })
    }

    /// Forget any conversational state accumulated across invocations.
    async fn reset(&self) -> Result<(), AgentError> {
        Ok(())
    }
}
