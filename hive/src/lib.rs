#![deny(missing_docs)]
//! # hive — umbrella crate
//!
//! One import surface for building agents from configuration and running
//! them as pipelines. Implementation crates are re-exported behind feature
//! flags; [`prelude`] covers the common path.

pub use hive_core;
#[cfg(feature = "agents")]
pub use hive_agents;
#[cfg(feature = "factory")]
pub use hive_factory;
#[cfg(feature = "memory")]
pub use hive_memory;
#[cfg(feature = "orch")]
pub use hive_orch;

/// Happy-path imports for composing hive workflows.
pub mod prelude {
    pub use hive_core::{
        Agent, AgentError, CancellationToken, Event, EventStream, Handle, Memory, MemoryHandle,
        Message, MessageKind, ModelClient, ModelHandle, Response, Task,
    };

    #[cfg(feature = "factory")]
    pub use hive_factory::{
        AgentKind, CloseError, ComponentFactory, ConfigRecord, FactoryError, MemoryKind,
        ProviderConnector, ProviderRegistry,
    };

    #[cfg(feature = "memory")]
    pub use hive_memory::{ListMemory, RetrievalMemory};

    #[cfg(feature = "agents")]
    pub use hive_agents::{AssistantAgent, BasicAgent, RetrievalAgent, Tool, ToolAgent, Toolbox};

    #[cfg(feature = "orch")]
    pub use hive_orch::{EdgeFilter, Graph, GraphBuilder, GraphError, Pipeline, PipelineState};
}
