//! Messages exchanged between participants.

use serde::{Deserialize, Serialize};

/// Source name reserved for the external caller of an agent or pipeline.
pub const USER: &str = "user";

/// What a message represents.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain conversational text.
    Text,
    /// Terminal message. A pipeline stops dispatching once one is produced.
    Stop,
    /// Transfer of control to another named participant.
    Handoff {
        /// The participant control is handed to.
        target: String,
    },
    /// Model reasoning surfaced alongside a response.
    Thought,
    /// Intermediate activity (tool calls, tool results, memory lookups).
    Event,
}

/// One attributed unit of conversation.
///
/// Messages are values: two messages with the same source, content and
/// kind are the same message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Name of the participant that produced this message.
    pub source: String,
    /// The message body.
    pub content: String,
    /// What the message represents.
    pub kind: MessageKind,
}

impl Message {
    /// Create a message of any kind.
    pub fn new(source: impl Into<String>, content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            kind,
        }
    }

    /// Create a plain text message.
    pub fn text(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(source, content, MessageKind::Text)
    }

    /// Create a text message attributed to the external caller.
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(USER, content)
    }

    /// Create a terminal stop message.
    pub fn stop(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(source, content, MessageKind::Stop)
    }

    /// Create a handoff message addressed to `target`.
    pub fn handoff(
        source: impl Into<String>,
        target: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(
            source,
            content,
            MessageKind::Handoff {
                target: target.into(),
            },
        )
    }

    /// Create a thought message.
    pub fn thought(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(source, content, MessageKind::Thought)
    }

    /// Create an intermediate event message.
    pub fn event(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(source, content, MessageKind::Event)
    }

    /// Whether this message terminates a run.
    pub fn is_stop(&self) -> bool {
        matches!(self.kind, MessageKind::Stop)
    }

    /// Whether this message was sent by the external caller.
    pub fn is_from_user(&self) -> bool {
        self.source.eq_ignore_ascii_case(USER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind() {
        assert_eq!(Message::text("a", "x").kind, MessageKind::Text);
        assert_eq!(Message::stop("a", "x").kind, MessageKind::Stop);
        assert_eq!(Message::thought("a", "x").kind, MessageKind::Thought);
        assert_eq!(Message::event("a", "x").kind, MessageKind::Event);
        assert_eq!(
            Message::handoff("a", "b", "x").kind,
            MessageKind::Handoff { target: "b".into() }
        );
    }

    #[test]
    fn user_source_is_case_insensitive() {
        assert!(Message::user("hi").is_from_user());
        assert!(Message::text("User", "hi").is_from_user());
        assert!(!Message::text("writer", "hi").is_from_user());
    }

    #[test]
    fn kind_serializes_with_tag() {
        let json = serde_json::to_value(Message::handoff("a", "b", "go")).unwrap();
        assert_eq!(json["kind"]["type"], "handoff");
        assert_eq!(json["kind"]["target"], "b");
    }
}
