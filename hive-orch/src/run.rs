//! Per-invocation run state and the dispatch loop.

use crate::graph::Graph;
use crate::obfuscate::obfuscate;
use futures::stream::{self, BoxStream, SelectAll};
use futures::{StreamExt, future};
use hive_core::{AgentError, CancellationToken, Event, Message, Response};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Events of one participant tagged with its index. `None` marks the end
/// of the participant's stream.
type NodeEvents<'a> = BoxStream<'a, (usize, Option<Result<Event, AgentError>>)>;

/// State of one pipeline run. Created at run start, consumed by
/// [`Run::finish`].
pub(crate) struct Run<'a> {
    pipeline: &'a str,
    graph: &'a Graph,
    run_id: Uuid,
    cancel: CancellationToken,
    limit: usize,
    input: Vec<Message>,
    waiting_on: Vec<usize>,
    ready: BTreeSet<usize>,
    produced: Vec<Vec<Message>>,
    done: Vec<bool>,
    in_flight: usize,
    streams: SelectAll<NodeEvents<'a>>,
    trace: Vec<Message>,
    stopped: bool,
}

impl<'a> Run<'a> {
    pub(crate) fn new(
        pipeline: &'a str,
        graph: &'a Graph,
        limit: usize,
        input: Vec<Message>,
        cancel: CancellationToken,
    ) -> Self {
        let n = graph.len();
        let waiting_on: Vec<usize> = (0..n).map(|i| graph.in_degree(i)).collect();
        let ready = (0..n).filter(|&i| waiting_on[i] == 0).collect();
        let run_id = Uuid::new_v4();
        tracing::info!(pipeline = %pipeline, run_id = %run_id, participants = n, "hive.pipeline.start");
        Self {
            pipeline,
            graph,
            run_id,
            cancel,
            limit: limit.max(1),
            input: obfuscate(input, graph),
            waiting_on,
            ready,
            produced: vec![Vec::new(); n],
            done: vec![false; n],
            in_flight: 0,
            streams: SelectAll::new(),
            trace: Vec::new(),
            stopped: false,
        }
    }

    /// Advance until the next message worth surfacing.
    ///
    /// Returns `Ok(None)` once every participant has finished or a stop
    /// message ended the run.
    pub(crate) async fn step(&mut self) -> Result<Option<Message>, AgentError> {
        loop {
            if self.stopped {
                return Ok(None);
            }
            self.dispatch();
            if self.in_flight == 0 {
                return Ok(None);
            }

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                next = self.streams.next() => next,
            };
            let Some((node, event)) = next else {
                return Err(self.cancelled());
            };
            if self.done[node] && event.is_some() {
                let err = AgentError::Other("event after final response".into());
                return Err(self.fail(node, err));
            }

            let surfaced = match event {
                Some(Ok(Event::Message(message))) => self.record(node, message),
                Some(Ok(Event::Response(response))) => self.complete(node, response),
                Some(Err(err)) => return Err(self.fail(node, err)),
                None if self.done[node] => None,
                None => {
                    let err = AgentError::Other("stream ended without a response".into());
                    return Err(self.fail(node, err));
                }
            };
            if surfaced.is_some() {
                return Ok(surfaced);
            }
        }
    }

    /// Build the final response from the trace.
    pub(crate) fn finish(self) -> Result<Response, AgentError> {
        tracing::info!(
            pipeline = %self.pipeline,
            run_id = %self.run_id,
            messages = self.trace.len(),
            stopped = self.stopped,
            "hive.pipeline.complete"
        );
        let pipeline = self.pipeline;
        Response::from_trace(self.trace)
            .ok_or_else(|| AgentError::Other(format!("{pipeline} produced no messages").into()))
    }

    fn dispatch(&mut self) {
        let graph = self.graph;
        while self.in_flight < self.limit {
            let Some(node) = self.ready.pop_first() else {
                break;
            };
            let agent = graph.node(node);
            tracing::debug!(
                pipeline = %self.pipeline,
                run_id = %self.run_id,
                participant = %agent.name(),
                "hive.pipeline.dispatch"
            );
            let events = agent
                .respond_stream(self.context_for(node), self.cancel.child_token())
                .map(move |event| (node, Some(event)))
                .chain(stream::once(future::ready((node, None))))
                .boxed();
            self.streams.push(events);
            self.in_flight += 1;
        }
    }

    /// The task followed by each predecessor's filtered output, in edge
    /// declaration order.
    fn context_for(&self, node: usize) -> Vec<Message> {
        let mut context = self.input.clone();
        for (from, filter) in self.graph.inputs(node) {
            context.extend(filter.select(&self.produced[from]));
        }
        context
    }

    fn record(&mut self, node: usize, message: Message) -> Option<Message> {
        self.produced[node].push(message.clone());
        if self.input.contains(&message) {
            return None;
        }
        self.trace.push(message.clone());
        if message.is_stop() {
            tracing::info!(
                pipeline = %self.pipeline,
                run_id = %self.run_id,
                participant = %message.source,
                "hive.pipeline.stop"
            );
            self.stopped = true;
            return None;
        }
        Some(message)
    }

    fn complete(&mut self, node: usize, response: Response) -> Option<Message> {
        // Participants that stream their chat message too (nested pipelines)
        // have already had it recorded.
        let produced = &self.produced[node];
        let streamed_chat = produced.len() > response.inner_messages.len()
            && produced.last() == Some(&response.chat_message);
        let surfaced = if streamed_chat {
            None
        } else {
            self.record(node, response.chat_message)
        };
        self.done[node] = true;
        self.in_flight -= 1;
        tracing::debug!(
            pipeline = %self.pipeline,
            run_id = %self.run_id,
            participant = %self.graph.node(node).name(),
            produced = self.produced[node].len(),
            "hive.pipeline.participant_done"
        );
        for &next in self.graph.outputs(node) {
            self.waiting_on[next] -= 1;
            if self.waiting_on[next] == 0 {
                self.ready.insert(next);
            }
        }
        surfaced
    }

    fn fail(&self, node: usize, err: AgentError) -> AgentError {
        if err.is_cancelled() && self.cancel.is_cancelled() {
            return self.cancelled();
        }
        let participant = self.graph.node(node).name().to_owned();
        tracing::warn!(
            pipeline = %self.pipeline,
            run_id = %self.run_id,
            participant = %participant,
            error = %err,
            "hive.pipeline.failed"
        );
        AgentError::ParticipantFailure {
            participant,
            source: Box::new(err),
            trace: self.trace.clone(),
        }
    }

    fn cancelled(&self) -> AgentError {
        tracing::info!(
            pipeline = %self.pipeline,
            run_id = %self.run_id,
            messages = self.trace.len(),
            "hive.pipeline.cancelled"
        );
        AgentError::Cancelled {
            trace: self.trace.clone(),
        }
    }
}
