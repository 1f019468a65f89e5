//! Provider dispatch: from `{provider, model, params}` to a live connection.

use crate::config::ModelSpec;
use crate::credential::Credential;
use crate::error::FactoryError;
use async_trait::async_trait;
use hive_core::{ModelClient, ModelError, ResourceKey};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Builds live connections for one provider.
///
/// Connectors are where the wire protocol lives; the factory decides when
/// they are called and caches what they return.
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    /// Open a connection for `spec`. `credential` is the resolved secret when
    /// the provider declares one.
    async fn connect(
        &self,
        spec: &ModelSpec,
        credential: Option<Credential>,
    ) -> Result<Arc<dyn ModelClient>, ModelError>;
}

/// Static facts about a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    /// Provider identifier as written in configuration.
    pub name: String,
    /// Variable holding the provider's secret, if it needs one.
    pub credential_var: Option<String>,
    /// Whether one client serves every model of the provider. Shared-client
    /// providers are keyed by provider alone.
    pub shared_client: bool,
}

impl ProviderInfo {
    /// A provider with no credential that connects per model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            credential_var: None,
            shared_client: false,
        }
    }

    /// Require the secret held in `var`.
    pub fn with_credential(mut self, var: impl Into<String>) -> Self {
        self.credential_var = Some(var.into());
        self
    }

    /// Share one client across every model.
    pub fn shared(mut self) -> Self {
        self.shared_client = true;
        self
    }
}

const KNOWN_PROVIDERS: &[(&str, Option<&str>, bool)] = &[
    ("azure", None, false),
    ("openai", Some("OPENAI_API_KEY"), false),
    ("foundry", Some("GITHUB_TOKEN"), false),
    ("anthropic", Some("ANTHROPIC_API_KEY"), false),
    ("ollama", Some("OLLAMA_API_KEY"), false),
    ("gemini", Some("GEMINI_API_KEY"), false),
    ("openai_assistant_api", Some("OPENAI_API_KEY"), true),
];

/// The providers a factory can connect to.
///
/// Starts out knowing the standard provider table, with no connectors.
/// A provider becomes usable once a connector is registered for it.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderInfo>,
    connectors: HashMap<String, Arc<dyn ProviderConnector>>,
}

impl ProviderRegistry {
    /// A registry with the standard provider table and no connectors.
    pub fn new() -> Self {
        let providers = KNOWN_PROVIDERS
            .iter()
            .map(|(name, var, shared)| {
                let mut info = ProviderInfo::new(*name);
                info.credential_var = var.map(str::to_owned);
                info.shared_client = *shared;
                ((*name).to_owned(), info)
            })
            .collect();
        Self {
            providers,
            connectors: HashMap::new(),
        }
    }

    /// Attach a connector to a provider. Unknown names are added as
    /// credential-less, per-model providers.
    pub fn with_connector(
        mut self,
        provider: impl Into<String>,
        connector: impl ProviderConnector + 'static,
    ) -> Self {
        let provider = provider.into();
        self.providers
            .entry(provider.clone())
            .or_insert_with(|| ProviderInfo::new(provider.clone()));
        self.connectors.insert(provider, Arc::new(connector));
        self
    }

    /// Register a provider together with its connector, replacing any
    /// previous entry of the same name.
    pub fn register(
        mut self,
        info: ProviderInfo,
        connector: Arc<dyn ProviderConnector>,
    ) -> Self {
        self.connectors.insert(info.name.clone(), connector);
        self.providers.insert(info.name.clone(), info);
        self
    }

    /// Facts about `provider`, whether or not it has a connector.
    pub fn info(&self, provider: &str) -> Option<&ProviderInfo> {
        self.providers.get(provider)
    }

    /// Every known provider, sorted by name.
    pub fn known(&self) -> impl Iterator<Item = &ProviderInfo> {
        self.providers.values()
    }

    /// Providers that have a connector, sorted by name.
    pub fn supported(&self) -> Vec<String> {
        self.providers
            .keys()
            .filter(|name| self.connectors.contains_key(*name))
            .cloned()
            .collect()
    }

    /// The cache key a model spec resolves to.
    pub fn key_for(&self, spec: &ModelSpec) -> ResourceKey {
        let shared = self
            .providers
            .get(&spec.provider)
            .is_some_and(|info| info.shared_client);
        if shared {
            ResourceKey::model(spec.provider.clone(), None, &serde_json::Map::new())
        } else {
            ResourceKey::model(spec.provider.clone(), Some(spec.model.clone()), &spec.params)
        }
    }

    pub(crate) fn resolve(
        &self,
        provider: &str,
    ) -> Result<(&ProviderInfo, &Arc<dyn ProviderConnector>), FactoryError> {
        match (self.providers.get(provider), self.connectors.get(provider)) {
            (Some(info), Some(connector)) => Ok((info, connector)),
            _ => Err(FactoryError::UnsupportedProvider {
                provider: provider.to_owned(),
                supported: self.supported(),
            }),
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("known", &self.providers.keys().collect::<Vec<_>>())
            .field("supported", &self.supported())
            .finish()
    }
}
