//! Context filters: per edge and per participant.

use async_trait::async_trait;
use hive_core::{Agent, AgentError, CancellationToken, EventStream, Message, Response};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Which of a predecessor's produced messages travel along an edge.
///
/// A participant produces its streamed inner messages followed by its
/// chat message. The default delivers only that final message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeFilter {
    /// The final message only.
    #[default]
    Latest,
    /// The last `n` messages.
    Last(usize),
    /// The first `n` messages.
    First(usize),
    /// Everything the predecessor produced.
    All,
}

impl EdgeFilter {
    /// The final message only.
    pub fn latest() -> Self {
        Self::Latest
    }

    /// The last `n` messages.
    pub fn last(n: usize) -> Self {
        Self::Last(n)
    }

    /// The first `n` messages.
    pub fn first(n: usize) -> Self {
        Self::First(n)
    }

    /// Everything.
    pub fn all() -> Self {
        Self::All
    }

    /// Apply the filter to a predecessor's produced messages.
    pub fn select(&self, produced: &[Message]) -> Vec<Message> {
        let range = match *self {
            EdgeFilter::Latest => produced.len().saturating_sub(1)..produced.len(),
            EdgeFilter::Last(n) => produced.len().saturating_sub(n)..produced.len(),
            EdgeFilter::First(n) => 0..n.min(produced.len()),
            EdgeFilter::All => 0..produced.len(),
        };
        produced[range].to_vec()
    }
}

/// Where a [`PerSourceFilter`] takes its messages from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPosition {
    /// Oldest first.
    First,
    /// Newest last.
    Last,
}

/// Keep messages from one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerSourceFilter {
    /// Source name to keep.
    pub source: String,
    /// End of the source's messages to take from.
    pub position: FilterPosition,
    /// How many to take; `None` keeps them all.
    pub count: Option<usize>,
}

impl PerSourceFilter {
    /// Keep every message from `source`.
    pub fn all(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            position: FilterPosition::First,
            count: None,
        }
    }

    /// Keep the first `count` messages from `source`.
    pub fn first(source: impl Into<String>, count: usize) -> Self {
        Self {
            source: source.into(),
            position: FilterPosition::First,
            count: Some(count),
        }
    }

    /// Keep the last `count` messages from `source`.
    pub fn last(source: impl Into<String>, count: usize) -> Self {
        Self {
            source: source.into(),
            position: FilterPosition::Last,
            count: Some(count),
        }
    }

    fn select_into(&self, messages: &[Message], keep: &mut BTreeSet<usize>) {
        let positions: Vec<usize> = messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.source == self.source)
            .map(|(i, _)| i)
            .collect();
        let count = self.count.unwrap_or(positions.len()).min(positions.len());
        let chosen = match self.position {
            FilterPosition::First => &positions[..count],
            FilterPosition::Last => &positions[positions.len() - count..],
        };
        keep.extend(chosen);
    }
}

/// A participant that only sees part of its context.
///
/// Messages from sources without a filter are dropped. The kept messages
/// stay in their original order. Everything else (name, description,
/// streaming, reset) is the wrapped participant's.
pub struct MessageFilterAgent {
    inner: Arc<dyn Agent>,
    filters: Vec<PerSourceFilter>,
}

impl MessageFilterAgent {
    /// Wrap `inner` with per-source filters.
    pub fn new(inner: Arc<dyn Agent>, filters: Vec<PerSourceFilter>) -> Self {
        Self { inner, filters }
    }

    /// The configured filters.
    pub fn filters(&self) -> &[PerSourceFilter] {
        &self.filters
    }

    /// Apply the filters to a context.
    pub fn apply(&self, messages: Vec<Message>) -> Vec<Message> {
        let mut keep = BTreeSet::new();
        for filter in &self.filters {
            filter.select_into(&messages, &mut keep);
        }
        messages
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep.contains(i))
            .map(|(_, m)| m)
            .collect()
    }
}

#[async_trait]
impl Agent for MessageFilterAgent {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    async fn respond(
        &self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<Response, AgentError> {
        self.inner.respond(self.apply(messages), cancel).await
    }

    fn respond_stream<'a>(
        &'a self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> EventStream<'a> {
        self.inner.respond_stream(self.apply(messages), cancel)
    }

    async fn reset(&self) -> Result<(), AgentError> {
        self.inner.reset().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_core::test_utils::ScriptedAgent;

    fn produced() -> Vec<Message> {
        vec![
            Message::thought("a", "t1"),
            Message::event("a", "e1"),
            Message::text("a", "final"),
        ]
    }

    #[test]
    fn edge_filters_select_from_produced() {
        let msgs = produced();
        assert_eq!(EdgeFilter::default().select(&msgs), vec![Message::text("a", "final")]);
        assert_eq!(EdgeFilter::last(2).select(&msgs), msgs[1..].to_vec());
        assert_eq!(EdgeFilter::first(1).select(&msgs), msgs[..1].to_vec());
        assert_eq!(EdgeFilter::all().select(&msgs), msgs);
        assert_eq!(EdgeFilter::last(10).select(&msgs), msgs);
        assert!(EdgeFilter::latest().select(&[]).is_empty());
    }

    #[tokio::test]
    async fn filter_agent_keeps_listed_sources_in_order() {
        let inner = Arc::new(ScriptedAgent::new("critic", "ok"));
        let agent = MessageFilterAgent::new(
            inner.clone(),
            vec![PerSourceFilter::all("user"), PerSourceFilter::last("writer", 1)],
        );
        assert_eq!(agent.name(), "critic");

        let context = vec![
            Message::user("task"),
            Message::text("writer", "draft 1"),
            Message::text("editor", "notes"),
            Message::text("writer", "draft 2"),
        ];
        agent.respond(context, CancellationToken::new()).await.unwrap();
        assert_eq!(
            inner.seen()[0],
            vec![Message::user("task"), Message::text("writer", "draft 2")]
        );
    }

    #[test]
    fn first_n_per_source() {
        let agent = MessageFilterAgent::new(
            Arc::new(ScriptedAgent::new("x", "y")),
            vec![PerSourceFilter::first("a", 2)],
        );
        let kept = agent.apply(vec![
            Message::text("a", "1"),
            Message::text("b", "skip"),
            Message::text("a", "2"),
            Message::text("a", "3"),
        ]);
        assert_eq!(kept, vec![Message::text("a", "1"), Message::text("a", "2")]);
    }

    #[tokio::test]
    async fn reset_reaches_the_wrapped_agent() {
        let inner = Arc::new(ScriptedAgent::new("x", "y"));
        let agent = MessageFilterAgent::new(inner.clone(), vec![]);
        agent.reset().await.unwrap();
        assert_eq!(inner.resets(), 1);
    }
}
