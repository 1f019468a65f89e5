//! Configuration records and the typed views agents and memories read.
//!
//! A record maps participant names to free-form configuration. The factory
//! only needs identity lookup from it; agent and memory kinds decode the
//! entries they care about.

use crate::error::FactoryError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default location of the agent configuration record.
pub const DEFAULT_AGENT_CONFIG_PATH: &str = ".config/agents.yml";

/// Default location of the memory configuration record.
pub const DEFAULT_MEMORY_CONFIG_PATH: &str = ".config/memory.yml";

/// Which configuration record an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// The agent record.
    Agent,
    /// The memory record.
    Memory,
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::Agent => f.write_str("agent"),
            ConfigKind::Memory => f.write_str("memory"),
        }
    }
}

/// Mapping from participant name to structured configuration.
///
/// Loaded once and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigRecord {
    entries: BTreeMap<String, serde_json::Value>,
}

impl ConfigRecord {
    /// An empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON mapping. `null` yields an empty record.
    pub fn from_value(value: serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::Null => Ok(Self::new()),
            serde_json::Value::Object(map) => Ok(Self {
                entries: map.into_iter().collect(),
            }),
            other => Err(format!(
                "top level must be a mapping of names, found {}",
                value_kind(&other)
            )),
        }
    }

    /// Load a record from a file. `.json` files are parsed as JSON,
    /// anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FactoryError> {
        let path = path.as_ref();
        let source_error = |message: String| FactoryError::ConfigSource {
            path: path.to_path_buf(),
            message,
        };
        let text = std::fs::read_to_string(path).map_err(|e| source_error(e.to_string()))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let value: serde_json::Value = if is_json {
            serde_json::from_str(&text).map_err(|e| source_error(e.to_string()))?
        } else {
            serde_yaml::from_str(&text).map_err(|e| source_error(e.to_string()))?
        };
        Self::from_value(value).map_err(source_error)
    }

    /// Load a record if the file exists, otherwise return an empty record.
    pub fn from_optional_path(path: impl AsRef<Path>) -> Result<Self, FactoryError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_path(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Add or replace an entry. Intended for building records in code.
    pub fn with_entry(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.entries.insert(name.into(), value);
        self
    }

    /// Raw configuration for `name`.
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.entries.get(name)
    }

    /// Whether `name` is configured.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Configured names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode the entry for `name` into a typed view.
    pub fn decode<T: DeserializeOwned>(
        &self,
        kind: ConfigKind,
        name: &str,
    ) -> Result<T, FactoryError> {
        let raw = self
            .entries
            .get(name)
            .ok_or_else(|| FactoryError::ConfigurationNotFound {
                kind,
                name: name.to_owned(),
            })?;
        let value = if raw.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            raw.clone()
        };
        serde_json::from_value(value).map_err(|e| FactoryError::InvalidConfiguration {
            kind,
            name: name.to_owned(),
            message: e.to_string(),
        })
    }
}

fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "a mapping",
    }
}

/// Which provider and model an agent talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Provider identifier (`openai`, `anthropic`, ...).
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Every other key: passed to the provider and part of the cache key.
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl ModelSpec {
    /// Create a spec with no extra parameters.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            params: serde_json::Map::new(),
        }
    }

    /// Add one extra parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Typed view of one agent's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// The model connection this agent uses.
    pub llm_config: ModelSpec,
    /// System instructions.
    #[serde(default)]
    pub instructions: Option<String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Tool-specific settings, interpreted by tool-using agents.
    #[serde(default)]
    pub tool_config: serde_json::Value,
    /// Identifier of an existing hosted assistant.
    #[serde(default)]
    pub assistant_id: Option<String>,
    /// Keys this view does not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AgentConfig {
    /// A config with only a model connection.
    pub fn new(llm_config: ModelSpec) -> Self {
        Self {
            llm_config,
            instructions: None,
            description: None,
            tool_config: serde_json::Value::Null,
            assistant_id: None,
            extra: serde_json::Map::new(),
        }
    }
}

fn default_k() -> usize {
    2
}

fn default_score_threshold() -> f64 {
    0.4
}

/// Retrieval parameters of a memory resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of results per query.
    #[serde(default = "default_k")]
    pub k: usize,
    /// Minimum relevance score for a result.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    /// Directory holding the persistent store, if any.
    #[serde(default)]
    pub persistence_path: Option<PathBuf>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            score_threshold: default_score_threshold(),
            persistence_path: None,
        }
    }
}

/// Typed view of one memory resource's configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Retrieval parameters.
    #[serde(default)]
    pub retrieval_config: RetrievalConfig,
    /// Keys this view does not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_config_splits_model_params() {
        let record = ConfigRecord::new().with_entry(
            "writer",
            json!({
                "llm_config": {"provider": "openai", "model": "gpt-4o", "temperature": 0.7},
                "instructions": "Write poems."
            }),
        );
        let config: AgentConfig = record.decode(ConfigKind::Agent, "writer").unwrap();
        assert_eq!(config.llm_config.provider, "openai");
        assert_eq!(config.llm_config.model, "gpt-4o");
        assert_eq!(config.llm_config.params.get("temperature"), Some(&json!(0.7)));
        assert_eq!(config.instructions.as_deref(), Some("Write poems."));
        assert!(config.tool_config.is_null());
    }

    #[test]
    fn missing_name_is_configuration_not_found() {
        let record = ConfigRecord::new();
        let err = record
            .decode::<AgentConfig>(ConfigKind::Agent, "ghost")
            .unwrap_err();
        assert!(matches!(err, FactoryError::ConfigurationNotFound { .. }));
        assert_eq!(err.to_string(), "agent ghost not found in configuration");
    }

    #[test]
    fn undecodable_entry_is_invalid_configuration() {
        let record = ConfigRecord::new().with_entry("writer", json!({"instructions": "x"}));
        let err = record
            .decode::<AgentConfig>(ConfigKind::Agent, "writer")
            .unwrap_err();
        assert!(matches!(err, FactoryError::InvalidConfiguration { .. }));
    }

    #[test]
    fn null_memory_entry_uses_defaults() {
        let record = ConfigRecord::new().with_entry("notes", serde_json::Value::Null);
        let config: MemoryConfig = record.decode(ConfigKind::Memory, "notes").unwrap();
        assert_eq!(config.retrieval_config.k, 2);
        assert_eq!(config.retrieval_config.score_threshold, 0.4);
        assert!(config.retrieval_config.persistence_path.is_none());
    }

    #[test]
    fn non_mapping_top_level_is_rejected() {
        assert!(ConfigRecord::from_value(json!(["a", "b"])).is_err());
        assert!(ConfigRecord::from_value(serde_json::Value::Null).unwrap().is_empty());
    }

    #[test]
    fn loads_yaml_and_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("agents.yml");
        std::fs::write(
            &yaml,
            "writer:\n  llm_config:\n    provider: openai\n    model: gpt-4o\n",
        )
        .unwrap();
        let json_path = dir.path().join("memory.json");
        std::fs::write(&json_path, r#"{"notes": {"retrieval_config": {"k": 5}}}"#).unwrap();

        let agents = ConfigRecord::from_path(&yaml).unwrap();
        assert!(agents.contains("writer"));
        let memory = ConfigRecord::from_path(&json_path).unwrap();
        let notes: MemoryConfig = memory.decode(ConfigKind::Memory, "notes").unwrap();
        assert_eq!(notes.retrieval_config.k, 5);
    }

    #[test]
    fn missing_file_is_config_source_error() {
        let err = ConfigRecord::from_path("/definitely/not/here.yml").unwrap_err();
        assert!(matches!(err, FactoryError::ConfigSource { .. }));
        let empty = ConfigRecord::from_optional_path("/definitely/not/here.yml").unwrap();
        assert!(empty.is_empty());
    }
}
