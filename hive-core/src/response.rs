//! Responses and streamed events.

use crate::error::AgentError;
use crate::message::Message;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// The result of one agent invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The principal message: what the agent answered.
    pub chat_message: Message,
    /// Everything produced along the way, in production order.
    #[serde(default)]
    pub inner_messages: Vec<Message>,
}

impl Response {
    /// A response with no inner messages.
    pub fn new(chat_message: Message) -> Self {
        Self {
            chat_message,
            inner_messages: vec![],
        }
    }

    /// Attach inner messages.
    pub fn with_inner(mut self, inner_messages: Vec<Message>) -> Self {
        self.inner_messages = inner_messages;
        self
    }

    /// Build a response from an ordered trace: the last message is principal.
    /// Returns `None` for an empty trace.
    pub fn from_trace(mut trace: Vec<Message>) -> Option<Self> {
        let chat_message = trace.pop()?;
        Some(Self {
            chat_message,
            inner_messages: trace,
        })
    }

    /// The full ordered trace: inner messages followed by the principal one.
    pub fn trace(&self) -> Vec<Message> {
        let mut trace = self.inner_messages.clone();
        trace.push(self.chat_message.clone());
        trace
    }
}

/// One item of a streamed response.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A message produced while the response is being assembled.
    Message(Message),
    /// The final response. Always the last item of a stream.
    Response(Response),
}

/// A lazy, finite, non-restartable sequence of events ending in one
/// [`Event::Response`], or in an error.
pub type EventStream<'a> = BoxStream<'a, Result<Event, AgentError>>;

/// Drain a stream and return its final response.
///
/// Intermediate messages are discarded; they are also part of the
/// response's inner messages.
pub async fn final_response(mut stream: EventStream<'_>) -> Result<Response, AgentError> {
    while let Some(event) = stream.next().await {
        if let Event::Response(response) = event? {
            return Ok(response);
        }
    }
    Err(AgentError::Other("stream ended without a response".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn from_trace_splits_last() {
        let trace = vec![
            Message::text("a", "1"),
            Message::text("b", "2"),
            Message::text("c", "3"),
        ];
        let response = Response::from_trace(trace.clone()).unwrap();
        assert_eq!(response.chat_message, Message::text("c", "3"));
        assert_eq!(response.inner_messages.len(), 2);
        assert_eq!(response.trace(), trace);
    }

    #[test]
    fn from_empty_trace_is_none() {
        assert!(Response::from_trace(vec![]).is_none());
    }

    #[tokio::test]
    async fn final_response_skips_messages() {
        let response = Response::new(Message::text("a", "done"));
        let events: EventStream<'static> = Box::pin(stream::iter(vec![
            Ok(Event::Message(Message::thought("a", "hmm"))),
            Ok(Event::Response(response.clone())),
        ]));
        assert_eq!(final_response(events).await.unwrap(), response);
    }

    #[tokio::test]
    async fn final_response_requires_a_response() {
        let events: EventStream<'static> = Box::pin(stream::iter(vec![Ok(Event::Message(
            Message::thought("a", "hmm"),
        ))]));
        assert!(matches!(
            final_response(events).await,
            Err(AgentError::Other(_))
        ));
    }
}
