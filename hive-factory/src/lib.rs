#![deny(missing_docs)]
//! Component factory for hive.
//!
//! The factory is the single place where model connections and memory
//! resources are built. It reads a name-keyed [`ConfigRecord`], derives a
//! [`hive_core::ResourceKey`] for each request, and hands out shared
//! [`hive_core::Handle`]s from a per-key cache:
//!
//! | Piece | Role |
//! |-------|------|
//! | [`ComponentFactory`] | `create_agent`, `load_memory`, `close` |
//! | [`ProviderRegistry`] / [`ProviderConnector`] | provider dispatch |
//! | [`CredentialSource`] | secret lookup, resolved only on cache miss |
//! | [`AgentKind`] / [`MemoryKind`] | per-variant construction |
//!
//! Construction failures are never cached, concurrent first requests for
//! one key build one resource, and teardown closes each resource once.

mod cache;
pub mod config;
pub mod credential;
pub mod error;
pub mod factory;
pub mod kind;
pub mod provider;

pub use config::{
    AgentConfig, ConfigKind, ConfigRecord, DEFAULT_AGENT_CONFIG_PATH, DEFAULT_MEMORY_CONFIG_PATH,
    MemoryConfig, ModelSpec, RetrievalConfig,
};
pub use credential::{Credential, CredentialSource, EnvCredentials, StaticCredentials};
pub use error::{CloseError, CloseFailure, FactoryError};
pub use factory::ComponentFactory;
pub use kind::{AgentInit, AgentKind, MemoryKind};
pub use provider::{ProviderConnector, ProviderInfo, ProviderRegistry};
