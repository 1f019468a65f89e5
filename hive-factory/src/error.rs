//! Errors returned by `hive-factory`.

use crate::config::ConfigKind;
use hive_core::{AgentError, MemoryError, ModelError, ResourceKey};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from constructing agents and memory resources.
///
/// None of these are cached: the failing call leaves the factory exactly as
/// it found it, and a later call retries construction.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The requested name is not a key of the configuration record.
    #[error("{kind} {name} not found in configuration")]
    ConfigurationNotFound {
        /// Which record was searched.
        kind: ConfigKind,
        /// The missing name.
        name: String,
    },

    /// The configuration entry exists but cannot be decoded.
    #[error("invalid {kind} configuration for {name}: {message}")]
    InvalidConfiguration {
        /// Which record the entry belongs to.
        kind: ConfigKind,
        /// The entry name.
        name: String,
        /// What was wrong with it.
        message: String,
    },

    /// The configuration source could not be loaded.
    #[error("cannot load configuration from {}: {message}", .path.display())]
    ConfigSource {
        /// The source path.
        path: PathBuf,
        /// Why loading failed.
        message: String,
    },

    /// No connector is available for the provider identifier.
    #[error("unsupported provider: {provider} (options are: {})", .supported.join(", "))]
    UnsupportedProvider {
        /// The unrecognized identifier.
        provider: String,
        /// Providers that can be connected.
        supported: Vec<String>,
    },

    /// A secret the provider requires is not available.
    #[error("{var} is not set; required by provider {provider}")]
    MissingCredential {
        /// The provider that needs the secret.
        provider: String,
        /// Name of the missing variable.
        var: String,
    },

    /// The provider connector failed to build a connection.
    #[error("failed to connect to {provider}: {source}")]
    Connect {
        /// The provider being connected.
        provider: String,
        /// The underlying failure.
        #[source]
        source: ModelError,
    },

    /// The memory backend failed to open.
    #[error("failed to open memory {name}: {source}")]
    Memory {
        /// The memory being opened.
        name: String,
        /// The underlying failure.
        #[source]
        source: MemoryError,
    },

    /// The agent kind rejected its configuration.
    #[error("failed to initialize agent {name}: {source}")]
    Initialization {
        /// The agent being initialized.
        name: String,
        /// The underlying failure.
        #[source]
        source: AgentError,
    },

    /// The factory has been closed and builds nothing further.
    #[error("component factory is closed")]
    Closed,
}

/// A resource that failed to close.
#[derive(Debug, Clone)]
pub struct CloseFailure {
    /// Key of the resource.
    pub key: ResourceKey,
    /// Why closing failed.
    pub message: String,
}

/// Every failure accumulated while closing a factory.
///
/// Teardown never stops at the first failure: every distinct resource is
/// attempted once, and all failures are reported together.
#[derive(Debug, Clone, Error)]
pub struct CloseError {
    /// The individual failures, in the order they were observed.
    pub failures: Vec<CloseFailure>,
}

impl fmt::Display for CloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} resource(s) failed to close", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.key, failure.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_provider_lists_options() {
        let err = FactoryError::UnsupportedProvider {
            provider: "acme".into(),
            supported: vec!["anthropic".into(), "openai".into()],
        };
        assert_eq!(
            err.to_string(),
            "unsupported provider: acme (options are: anthropic, openai)"
        );
    }

    #[test]
    fn close_error_lists_every_failure() {
        let err = CloseError {
            failures: vec![
                CloseFailure {
                    key: ResourceKey::memory("a"),
                    message: "disk full".into(),
                },
                CloseFailure {
                    key: ResourceKey::memory("b"),
                    message: "gone".into(),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("2 resource(s) failed to close"));
        assert!(text.contains("memory:a: disk full"));
        assert!(text.contains("memory:b: gone"));
    }
}
