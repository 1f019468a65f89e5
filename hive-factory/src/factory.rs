//! The component factory.

use crate::cache::{CacheError, HandleCache};
use crate::config::{AgentConfig, ConfigKind, ConfigRecord, MemoryConfig, ModelSpec};
use crate::credential::{CredentialSource, EnvCredentials};
use crate::error::{CloseError, CloseFailure, FactoryError};
use crate::kind::{AgentInit, AgentKind, MemoryKind};
use crate::provider::ProviderRegistry;
use hive_core::{Handle, Memory, MemoryHandle, ModelClient, ModelHandle, ResourceKey};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single point of construction, caching and teardown for model-backed
/// agents and memory resources.
///
/// Every agent whose configuration derives the same [`ResourceKey`] shares
/// one model connection, and every request for a memory name shares one
/// memory resource. The factory owns both caches; [`ComponentFactory::close`]
/// tears down every distinct resource exactly once.
///
/// Clones share the same caches.
///
/// ```no_run
/// # async fn demo(providers: hive_factory::ProviderRegistry) -> Result<(), Box<dyn std::error::Error>> {
/// use hive_factory::ComponentFactory;
///
/// let factory = ComponentFactory::from_paths(".config/agents.yml", ".config/memory.yml", providers)?;
/// let client = factory.model_for("writer").await?;
/// println!("{}", client.key());
/// factory.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ComponentFactory {
    agents: Arc<ConfigRecord>,
    memory: Arc<ConfigRecord>,
    providers: Arc<ProviderRegistry>,
    credentials: Arc<dyn CredentialSource>,
    models: Arc<HandleCache<dyn ModelClient>>,
    memories: Arc<HandleCache<dyn Memory>>,
    closed: Arc<AtomicBool>,
}

impl ComponentFactory {
    /// Create a factory over an agent configuration record.
    ///
    /// Credentials come from the process environment unless replaced with
    /// [`ComponentFactory::with_credentials`].
    pub fn new(agents: ConfigRecord, providers: ProviderRegistry) -> Self {
        Self {
            agents: Arc::new(agents),
            memory: Arc::new(ConfigRecord::new()),
            providers: Arc::new(providers),
            credentials: Arc::new(EnvCredentials),
            models: Arc::new(HandleCache::new()),
            memories: Arc::new(HandleCache::new()),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load both configuration records from disk.
    ///
    /// A missing agent file is an error; a missing memory file yields an
    /// empty memory record.
    pub fn from_paths(
        agent_path: impl AsRef<Path>,
        memory_path: impl AsRef<Path>,
        providers: ProviderRegistry,
    ) -> Result<Self, FactoryError> {
        let agents = ConfigRecord::from_path(agent_path)?;
        let memory = ConfigRecord::from_optional_path(memory_path)?;
        Ok(Self::new(agents, providers).with_memory_config(memory))
    }

    /// Replace the memory configuration record.
    pub fn with_memory_config(mut self, memory: ConfigRecord) -> Self {
        self.memory = Arc::new(memory);
        self
    }

    /// Replace the credential source.
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    /// The agent configuration record.
    pub fn agent_config(&self) -> &ConfigRecord {
        &self.agents
    }

    /// The memory configuration record.
    pub fn memory_config(&self) -> &ConfigRecord {
        &self.memory
    }

    /// The provider registry.
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Whether [`ComponentFactory::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Build the agent configured under `name` as variant `K`.
    ///
    /// The model connection is taken from the cache or built once and
    /// cached. `memory` handles are passed through to the agent.
    pub async fn create_agent<K: AgentKind>(
        &self,
        name: &str,
        memory: &[MemoryHandle],
    ) -> Result<K, FactoryError> {
        self.ensure_open()?;
        let config: AgentConfig = self.agents.decode(ConfigKind::Agent, name)?;
        let client = self.model_client(&config.llm_config).await?;
        let init = AgentInit {
            name: name.to_owned(),
            config,
            client,
            memory: memory.to_vec(),
        };
        let agent = K::initialize(init).map_err(|source| FactoryError::Initialization {
            name: name.to_owned(),
            source,
        })?;
        tracing::debug!(agent = %name, memory = memory.len(), "hive.factory.agent_created");
        Ok(agent)
    }

    /// The shared model connection the agent `name` would use.
    pub async fn model_for(&self, name: &str) -> Result<ModelHandle, FactoryError> {
        self.ensure_open()?;
        let config: AgentConfig = self.agents.decode(ConfigKind::Agent, name)?;
        self.model_client(&config.llm_config).await
    }

    /// The shared model connection for `spec`, built on first use.
    pub async fn model_client(&self, spec: &ModelSpec) -> Result<ModelHandle, FactoryError> {
        self.ensure_open()?;
        let (info, connector) = self.providers.resolve(&spec.provider)?;
        let key = self.providers.key_for(spec);

        let lookup = self
            .models
            .get_or_try_init(&key, || async {
                tracing::debug!(key = %key, "hive.factory.cache_miss");
                let credential = match &info.credential_var {
                    Some(var) => Some(self.credentials.resolve(var).await.ok_or_else(|| {
                        FactoryError::MissingCredential {
                            provider: spec.provider.clone(),
                            var: var.clone(),
                        }
                    })?),
                    None => None,
                };
                let client = connector.connect(spec, credential).await.map_err(|source| {
                    FactoryError::Connect {
                        provider: spec.provider.clone(),
                        source,
                    }
                })?;
                tracing::info!(key = %key, "hive.factory.connect");
                Ok(Handle::new(key.clone(), client))
            })
            .await;

        match lookup {
            Ok((handle, built)) => {
                if !built {
                    tracing::debug!(key = %key, "hive.factory.cache_hit");
                }
                Ok(handle)
            }
            Err(CacheError::Init(err)) => {
                tracing::warn!(key = %key, error = %err, "hive.factory.connect_failed");
                Err(err)
            }
            Err(CacheError::Closed { orphan }) => {
                if let Some(handle) = orphan {
                    if let Err(err) = handle.close().await {
                        tracing::warn!(key = %key, error = %err, "hive.factory.close_failed");
                    }
                }
                Err(FactoryError::Closed)
            }
        }
    }

    /// Open the memory resource configured under `name` as variant `M`.
    ///
    /// Every request for `name` shares the first resource opened, whatever
    /// variant later callers ask for.
    pub async fn load_memory<M: MemoryKind>(&self, name: &str) -> Result<MemoryHandle, FactoryError> {
        self.ensure_open()?;
        let config: MemoryConfig = self.memory.decode(ConfigKind::Memory, name)?;
        let key = ResourceKey::memory(name);

        let lookup = self
            .memories
            .get_or_try_init(&key, || async {
                tracing::debug!(key = %key, "hive.factory.cache_miss");
                let memory = M::open(name, &config)
                    .await
                    .map_err(|source| FactoryError::Memory {
                        name: name.to_owned(),
                        source,
                    })?;
                tracing::info!(key = %key, "hive.factory.memory_opened");
                let memory: Arc<dyn Memory> = Arc::new(memory);
                Ok(Handle::new(key.clone(), memory))
            })
            .await;

        match lookup {
            Ok((handle, built)) => {
                if !built {
                    tracing::debug!(key = %key, "hive.factory.cache_hit");
                }
                Ok(handle)
            }
            Err(CacheError::Init(err)) => {
                tracing::warn!(key = %key, error = %err, "hive.factory.memory_failed");
                Err(err)
            }
            Err(CacheError::Closed { orphan }) => {
                if let Some(handle) = orphan {
                    if let Err(err) = handle.close().await {
                        tracing::warn!(key = %key, error = %err, "hive.factory.close_failed");
                    }
                }
                Err(FactoryError::Closed)
            }
        }
    }

    /// Keys of the live model connections, in construction order.
    pub async fn cached_models(&self) -> Vec<ResourceKey> {
        self.models.keys()
    }

    /// Keys of the live memory resources, in construction order.
    pub async fn cached_memories(&self) -> Vec<ResourceKey> {
        self.memories.keys()
    }

    /// Close every cached resource exactly once.
    ///
    /// Model connections are closed first, then memory resources. Failures
    /// are collected and reported together; they never stop teardown. After
    /// this call the factory builds nothing, and calling it again is a no-op.
    pub async fn close(&self) -> Result<(), CloseError> {
        self.closed.store(true, Ordering::SeqCst);
        let models = self.models.drain();
        let memories = self.memories.drain();
        if models.is_empty() && memories.is_empty() {
            return Ok(());
        }
        tracing::info!(
            models = models.len(),
            memories = memories.len(),
            "hive.factory.close"
        );

        let mut failures = Vec::new();
        for handle in models {
            if let Err(err) = handle.close().await {
                tracing::warn!(key = %handle.key(), error = %err, "hive.factory.close_failed");
                failures.push(CloseFailure {
                    key: handle.key().clone(),
                    message: err.to_string(),
                });
            }
        }
        for handle in memories {
            if let Err(err) = handle.close().await {
                tracing::warn!(key = %handle.key(), error = %err, "hive.factory.close_failed");
                failures.push(CloseFailure {
                    key: handle.key().clone(),
                    message: err.to_string(),
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CloseError { failures })
        }
    }

    fn ensure_open(&self) -> Result<(), FactoryError> {
        if self.is_closed() {
            Err(FactoryError::Closed)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("agents", &self.agents.names().collect::<Vec<_>>())
            .field("memory", &self.memory.names().collect::<Vec<_>>())
            .field("providers", &self.providers)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn factory_is_shareable() {
        _assert_send_sync::<ComponentFactory>();
    }

    #[tokio::test]
    async fn closed_factory_refuses_work() {
        let factory = ComponentFactory::new(ConfigRecord::new(), ProviderRegistry::new());
        assert!(factory.close().await.is_ok());
        assert!(factory.is_closed());
        assert!(matches!(
            factory.model_for("anyone").await,
            Err(FactoryError::Closed)
        ));
        assert!(factory.close().await.is_ok());
    }
}
