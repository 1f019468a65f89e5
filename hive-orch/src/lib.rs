#![deny(missing_docs)]
//! DAG pipelines over hive agents.
//!
//! A [`GraphBuilder`] collects participants (any [`hive_core::Agent`],
//! including other pipelines) and the edges between them, and validates
//! the result into an immutable [`Graph`]. A [`Pipeline`] runs a task over
//! that graph:
//!
//! - a participant starts once every predecessor has produced output;
//! - fan-out delivers the same output to each successor;
//! - fan-in receives predecessors' outputs in edge-declaration order;
//! - a stop message ends the run early.
//!
//! Runs stream their messages as they are produced and end in a single
//! [`hive_core::Response`]. Participant failures abort the run with the
//! partial trace; cancellation is cooperative via
//! [`hive_core::CancellationToken`].

mod error;
mod filter;
mod graph;
mod obfuscate;
mod pipeline;
mod run;

pub use error::GraphError;
pub use filter::{EdgeFilter, FilterPosition, MessageFilterAgent, PerSourceFilter};
pub use graph::{Edge, Graph, GraphBuilder};
pub use obfuscate::obfuscate;
pub use pipeline::{Pipeline, PipelineState};
