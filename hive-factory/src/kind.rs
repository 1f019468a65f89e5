//! Construction traits for agent and memory variants.

use crate::config::{AgentConfig, MemoryConfig};
use hive_core::{Agent, AgentError, Memory, MemoryError, MemoryHandle, ModelHandle};
use std::future::Future;

/// Everything an agent variant receives at construction.
#[derive(Debug, Clone)]
pub struct AgentInit {
    /// The participant name the agent was requested under.
    pub name: String,
    /// Its decoded configuration.
    pub config: AgentConfig,
    /// The shared model connection for its `llm_config`.
    pub client: ModelHandle,
    /// Memory resources attached by the caller.
    pub memory: Vec<MemoryHandle>,
}

/// An agent variant the factory can build.
pub trait AgentKind: Agent + Sized + 'static {
    /// Build the agent. Must not open connections of its own; the model
    /// connection arrives in `init.client`.
    fn initialize(init: AgentInit) -> Result<Self, AgentError>;
}

/// A memory variant the factory can open.
pub trait MemoryKind: Memory + Sized + 'static {
    /// Open the resource. May open a persistent store; never ingests content.
    fn open(
        name: &str,
        config: &MemoryConfig,
    ) -> impl Future<Output = Result<Self, MemoryError>> + Send;
}
