//! Error types for each protocol.

use crate::message::Message;
use thiserror::Error;

/// Errors from a model provider connection.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ModelError {
    /// HTTP or network request failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Provider rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// Authentication/authorization failed.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// Could not interpret the provider's response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The connection has already been closed.
    #[error("connection closed")]
    Closed,

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ModelError {
    /// Whether retrying this request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ModelError::RateLimited | ModelError::RequestFailed(_))
    }
}

/// Errors from a memory store.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Reading or writing the backing store failed.
    #[error("io error: {0}")]
    Io(String),

    /// Stored content could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store has already been closed.
    #[error("memory {0} is closed")]
    Closed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from an agent invocation, including pipeline runs.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model call failed.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// A memory lookup or write failed.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    /// A tool could not be executed.
    #[error("tool error in {tool}: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Error message.
        message: String,
    },

    /// The context handed to the agent cannot be processed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A participant of a pipeline failed; the run was aborted.
    #[error("participant {participant} failed: {source}")]
    ParticipantFailure {
        /// Name of the failing participant.
        participant: String,
        /// What went wrong inside the participant.
        #[source]
        source: Box<AgentError>,
        /// Messages produced before the failure. Incomplete by definition.
        trace: Vec<Message>,
    },

    /// The run was cancelled before it completed.
    #[error("cancelled after {} messages", .trace.len())]
    Cancelled {
        /// Messages produced before cancellation took effect.
        trace: Vec<Message>,
    },

    /// The agent is already running and does not accept overlapping runs.
    #[error("{0} is already running")]
    Busy(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl AgentError {
    /// Whether this error is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled { .. })
    }

    /// The partial trace carried by run-level errors, if any.
    pub fn partial_trace(&self) -> Option<&[Message]> {
        match self {
            AgentError::ParticipantFailure { trace, .. } | AgentError::Cancelled { trace } => {
                Some(trace)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_retryable() {
        assert!(ModelError::RateLimited.is_retryable());
        assert!(ModelError::RequestFailed("timeout".into()).is_retryable());
        assert!(!ModelError::AuthFailed("bad key".into()).is_retryable());
        assert!(!ModelError::Closed.is_retryable());
    }

    #[test]
    fn participant_failure_display_names_participant() {
        let err = AgentError::ParticipantFailure {
            participant: "editor1".into(),
            source: Box::new(AgentError::Model(ModelError::RateLimited)),
            trace: vec![Message::text("writer", "draft")],
        };
        assert_eq!(
            err.to_string(),
            "participant editor1 failed: model error: rate limited"
        );
        assert_eq!(err.partial_trace().map(|t| t.len()), Some(1));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn cancelled_reports_trace_length() {
        let err = AgentError::Cancelled {
            trace: vec![Message::text("a", "1"), Message::text("b", "2")],
        };
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "cancelled after 2 messages");
    }
}
