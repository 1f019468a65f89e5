//! The pipeline: a graph of participants run as one agent.

use crate::graph::Graph;
use crate::run::Run;
use async_trait::async_trait;
use hive_core::{
    Agent, AgentError, CancellationToken, Event, EventStream, Message, Response, Task,
    final_response,
};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Where a pipeline is in its lifecycle.
///
/// `Idle → Running → {Completed, Cancelled, Failed}`. Any state but
/// `Running` may start a new run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    /// Never run, or reset.
    Idle = 0,
    /// A run is in progress.
    Running = 1,
    /// The last run produced a response.
    Completed = 2,
    /// The last run was cancelled or its stream dropped.
    Cancelled = 3,
    /// A participant failed during the last run.
    Failed = 4,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::Cancelled,
            4 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

/// Holds the `Running` state for the duration of a run and records the
/// outcome when dropped. A run dropped before it finished is `Cancelled`.
struct RunGuard<'a> {
    state: &'a AtomicU8,
    outcome: PipelineState,
}

impl<'a> RunGuard<'a> {
    fn acquire(state: &'a AtomicU8, name: &str) -> Result<Self, AgentError> {
        state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current != PipelineState::Running as u8).then_some(PipelineState::Running as u8)
            })
            .map_err(|_| AgentError::Busy(name.to_owned()))?;
        Ok(Self {
            state,
            outcome: PipelineState::Cancelled,
        })
    }

    fn finish(&mut self, outcome: PipelineState) {
        self.outcome = outcome;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.store(self.outcome as u8, Ordering::SeqCst);
    }
}

/// Runs a fixed set of participants over a validated [`Graph`].
///
/// A participant is dispatched once all its predecessors have produced
/// output. It sees the task (with foreign sources rewritten, see
/// [`obfuscate`](crate::obfuscate)) followed by its predecessors' filtered
/// outputs. The run ends when every participant has answered or one emits a
/// stop message.
///
/// In-flight participants are polled together on the caller's task; nothing
/// is spawned. The trace is in completion order. A pipeline runs one task
/// at a time and is itself an [`Agent`], so it can be a node of another
/// pipeline.
///
/// ```
/// use hive_core::test_utils::ScriptedAgent;
/// use hive_orch::{GraphBuilder, Pipeline};
/// use std::sync::Arc;
///
/// let mut builder = GraphBuilder::new();
/// builder
///     .add_node(Arc::new(ScriptedAgent::new("writer", "a poem")))?
///     .add_node(Arc::new(ScriptedAgent::new("editor", "a better poem")))?
///     .add_edge("writer", "editor")?;
/// let pipeline = Pipeline::new("poetry", "writes poems", builder.build()?);
/// assert_eq!(pipeline.graph().start_nodes(), vec!["writer"]);
/// # Ok::<(), hive_orch::GraphError>(())
/// ```
pub struct Pipeline {
    name: String,
    description: String,
    graph: Graph,
    max_concurrency: usize,
    state: AtomicU8,
}

impl Pipeline {
    /// Create a pipeline over `graph`. Concurrency is unbounded.
    pub fn new(name: impl Into<String>, description: impl Into<String>, graph: Graph) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            graph,
            max_concurrency: usize::MAX,
            state: AtomicU8::new(PipelineState::Idle as u8),
        }
    }

    /// Bound the number of participants in flight. Zero is treated as one.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    /// Run one participant at a time, in topological order.
    pub fn sequential(self) -> Self {
        self.with_max_concurrency(1)
    }

    /// The graph this pipeline runs.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Run `task` to completion.
    pub async fn run(&self, task: impl Into<Task>) -> Result<Response, AgentError> {
        self.run_with_cancel(task, CancellationToken::new()).await
    }

    /// Run `task` to completion, observing `cancel`.
    pub async fn run_with_cancel(
        &self,
        task: impl Into<Task>,
        cancel: CancellationToken,
    ) -> Result<Response, AgentError> {
        final_response(self.run_stream(task, cancel)).await
    }

    /// Run `task`, yielding each produced message as it arrives.
    ///
    /// Messages identical to an input message and stop messages are not
    /// yielded; both remain in the final [`Response`], which is the last
    /// item. Dropping the stream early cancels the run.
    pub fn run_stream<'a>(
        &'a self,
        task: impl Into<Task>,
        cancel: CancellationToken,
    ) -> EventStream<'a> {
        let messages = task.into().into_messages();
        Box::pin(async_stream::try_stream! {
            let mut guard = RunGuard::acquire(&self.state, &self.name)?;
            let mut run = Run::new(&self.name, &self.graph, self.max_concurrency, messages, cancel);
            loop {
                match run.step().await {
                    Ok(Some(message)) => yield Event::Message(message),
                    Ok(None) => break,
                    Err(err) => {
                        let outcome = if err.is_cancelled() {
                            PipelineState::Cancelled
                        } else {
                            PipelineState::Failed
                        };
                        guard.finish(outcome);
                        Err::<(), _>(err)?;
                    }
                }
            }
            match run.finish() {
                Ok(response) => {
                    guard.finish(PipelineState::Completed);
                    yield Event::Response(response);
                }
                Err(err) => {
                    guard.finish(PipelineState::Failed);
                    Err::<(), _>(err)?;
                }
            }
        })
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("graph", &self.graph)
            .field("max_concurrency", &self.max_concurrency)
            .field("state", &self.state())
            .finish()
    }
}

#[async_trait]
impl Agent for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn respond(
        &self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<Response, AgentError> {
        self.run_with_cancel(messages, cancel).await
    }

    fn respond_stream<'a>(
        &'a self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> EventStream<'a> {
        self.run_stream(messages, cancel)
    }

    /// Reset every participant and return to `Idle`.
    async fn reset(&self) -> Result<(), AgentError> {
        let mut guard = RunGuard::acquire(&self.state, &self.name)?;
        guard.finish(PipelineState::Idle);
        for participant in self.graph.participants() {
            participant.reset().await?;
        }
        Ok(())
    }
}
