//! Chronological list memory.

use async_trait::async_trait;
use hive_core::{Memory, MemoryError, MemoryResult};
use hive_factory::{MemoryConfig, MemoryKind};
use tokio::sync::RwLock;

/// Memory that keeps every entry in insertion order.
///
/// There is no ranking: every query returns every entry, oldest first,
/// with score `1.0`. Suitable for short-lived context and tests.
pub struct ListMemory {
    name: String,
    state: RwLock<ListState>,
}

struct ListState {
    entries: Vec<MemoryResult>,
    closed: bool,
}

impl ListMemory {
    /// Create an empty list memory.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(ListState {
                entries: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    fn closed_error(&self) -> MemoryError {
        MemoryError::Closed(self.name.clone())
    }
}

#[async_trait]
impl Memory for ListMemory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, content: String, metadata: serde_json::Value) -> Result<(), MemoryError> {
        let mut state = self.state.write().await;
        if state.closed {
            return Err(self.closed_error());
        }
        state.entries.push(MemoryResult::new(content, metadata, 1.0));
        Ok(())
    }

    async fn query(&self, _text: &str) -> Result<Vec<MemoryResult>, MemoryError> {
        let state = self.state.read().await;
        if state.closed {
            return Err(self.closed_error());
        }
        Ok(state.entries.clone())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        let mut state = self.state.write().await;
        if state.closed {
            return Err(self.closed_error());
        }
        state.entries.clear();
        Ok(())
    }

    async fn close(&self) -> Result<(), MemoryError> {
        self.state.write().await.closed = true;
        Ok(())
    }
}

impl MemoryKind for ListMemory {
    async fn open(name: &str, _config: &MemoryConfig) -> Result<Self, MemoryError> {
        Ok(Self::new(name))
    }
}
