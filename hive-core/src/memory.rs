//! The Memory protocol — retrievable content attached to agents.

use crate::error::MemoryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A queryable, mutable store of retrievable content.
///
/// Implementations:
/// - `ListMemory`: chronological list, every entry is relevant
/// - `RetrievalMemory`: ranked lexical retrieval with optional persistence
/// - a vector database adapter (out of tree)
///
/// Memory stores are factory-owned resources. Agents query and add to them
/// but never call [`Memory::close`]; the factory does that at teardown.
#[async_trait]
pub trait Memory: Send + Sync {
    /// Declared name of this memory resource.
    fn name(&self) -> &str;

    /// Add one piece of content with free-form metadata.
    async fn add(&self, content: String, metadata: serde_json::Value) -> Result<(), MemoryError>;

    /// Return entries relevant to `text`, best first.
    async fn query(&self, text: &str) -> Result<Vec<MemoryResult>, MemoryError>;

    /// Remove every entry.
    async fn clear(&self) -> Result<(), MemoryError>;

    /// Release the backing store. Further operations fail.
    async fn close(&self) -> Result<(), MemoryError>;
}

/// One ranked entry returned by [`Memory::query`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryResult {
    /// The stored content.
    pub content: String,
    /// Metadata stored alongside the content.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Relevance score (higher is more relevant).
    pub score: f64,
}

impl MemoryResult {
    /// Create a new result.
    pub fn new(content: impl Into<String>, metadata: serde_json::Value, score: f64) -> Self {
        Self {
            content: content.into(),
            metadata,
            score,
        }
    }
}
