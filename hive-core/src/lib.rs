//! # hive-core — protocol types for composable agent workflows
//!
//! This crate defines the boundaries every other hive crate is written
//! against. Nothing here talks to a network or a disk.
//!
//! ## The Protocols
//!
//! | Protocol | Trait | What it does |
//! |----------|-------|-------------|
//! | Agent | [`Agent`] | A named participant that responds to a context |
//! | Memory | [`Memory`] | A queryable, mutable retrieval store |
//! | Model | [`ModelClient`] | A live connection to an LLM provider |
//!
//! ## The Data
//!
//! | Type | What it is |
//! |------|-----------|
//! | [`Message`] | One attributed unit of conversation |
//! | [`Task`] | What a caller hands to an agent or pipeline |
//! | [`Response`] | A principal message plus the inner trace that led to it |
//! | [`Event`] | One item of a streamed response |
//! | [`Handle`] | A shared, factory-owned backend resource |
//!
//! ## Ownership
//!
//! Backend resources (model clients, memory stores) are wrapped in a
//! [`Handle`]. Agents share handles freely, but only the component factory
//! that created a handle closes it. Nothing in this crate holds global
//! state.

#![deny(missing_docs)]

pub mod agent;
pub mod error;
pub mod memory;
pub mod message;
pub mod model;
pub mod resource;
pub mod response;
pub mod task;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use agent::Agent;
pub use error::{AgentError, MemoryError, ModelError};
pub use memory::{Memory, MemoryResult};
pub use message::{Message, MessageKind, USER};
pub use model::{ChatTurn, Completion, CompletionRequest, ModelClient, Role, ToolCall, ToolSchema, Usage};
pub use resource::{Handle, MemoryHandle, ModelHandle, ResourceKey};
pub use response::{Event, EventStream, Response, final_response};
pub use task::Task;

/// Cooperative cancellation signal shared by pipelines and agents.
pub use tokio_util::sync::CancellationToken;
