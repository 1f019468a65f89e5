//! Ranked retrieval memory with optional file persistence.

use crate::score::{cosine, term_frequencies};
use async_trait::async_trait;
use hive_core::{Memory, MemoryError, MemoryResult};
use hive_factory::{MemoryConfig, MemoryKind, RetrievalConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Memory that ranks entries by term-frequency cosine similarity.
///
/// `query` returns at most `k` entries whose score is at least
/// `score_threshold`, best first; ties keep insertion order.
///
/// With a persistence directory, the store lives in `<dir>/<name>.json`:
/// it is loaded when the memory is opened and rewritten after every
/// mutation and on close. The directory is created lazily on first write.
pub struct RetrievalMemory {
    name: String,
    k: usize,
    score_threshold: f64,
    file: Option<PathBuf>,
    state: RwLock<StoreState>,
}

struct StoreState {
    entries: Vec<StoredEntry>,
    closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    content: String,
    #[serde(default)]
    metadata: serde_json::Value,
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    name: String,
    entries: Vec<StoredEntry>,
}

impl RetrievalMemory {
    /// Create an empty, non-persistent retrieval memory.
    ///
    /// `persistence_path` in `config` is ignored; use
    /// [`RetrievalMemory::open`] to load a persistent store.
    pub fn new(name: impl Into<String>, config: &RetrievalConfig) -> Self {
        Self {
            name: name.into(),
            k: config.k,
            score_threshold: config.score_threshold,
            file: None,
            state: RwLock::new(StoreState {
                entries: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Open a retrieval memory, loading its persistent store if configured.
    pub async fn open(name: &str, config: &RetrievalConfig) -> Result<Self, MemoryError> {
        let mut memory = Self::new(name, config);
        if let Some(dir) = &config.persistence_path {
            let file = dir.join(store_filename(name));
            let entries = load_entries(&file).await?;
            tracing::debug!(
                memory = %name,
                path = %file.display(),
                entries = entries.len(),
                "hive.memory.loaded"
            );
            memory.state.get_mut().entries = entries;
            memory.file = Some(file);
        }
        Ok(memory)
    }

    /// Path of the backing file, when persistent.
    pub fn store_path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    async fn persist(&self, entries: &[StoredEntry]) -> Result<(), MemoryError> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        if let Some(dir) = file.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| MemoryError::Io(e.to_string()))?;
        }
        let contents = serde_json::to_string_pretty(&StoreFile {
            name: self.name.clone(),
            entries: entries.to_vec(),
        })
        .map_err(|e| MemoryError::Serialization(e.to_string()))?;
        tokio::fs::write(file, contents)
            .await
            .map_err(|e| MemoryError::Io(e.to_string()))
    }

    fn closed_error(&self) -> MemoryError {
        MemoryError::Closed(self.name.clone())
    }
}

/// Encode a memory name into a safe filename.
fn store_filename(name: &str) -> String {
    let mut encoded = String::new();
    for ch in name.chars() {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => encoded.push(ch),
            _ => {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).bytes() {
                    encoded.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    format!("{encoded}.json")
}

async fn load_entries(file: &Path) -> Result<Vec<StoredEntry>, MemoryError> {
    match tokio::fs::read_to_string(file).await {
        Ok(contents) => {
            let store: StoreFile = serde_json::from_str(&contents)
                .map_err(|e| MemoryError::Serialization(e.to_string()))?;
            Ok(store.entries)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(MemoryError::Io(e.to_string())),
    }
}

#[async_trait]
impl Memory for RetrievalMemory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, content: String, metadata: serde_json::Value) -> Result<(), MemoryError> {
        let mut state = self.state.write().await;
        if state.closed {
            return Err(self.closed_error());
        }
        state.entries.push(StoredEntry { content, metadata });
        if let Err(err) = self.persist(&state.entries).await {
            state.entries.pop();
            return Err(err);
        }
        Ok(())
    }

    async fn query(&self, text: &str) -> Result<Vec<MemoryResult>, MemoryError> {
        let state = self.state.read().await;
        if state.closed {
            return Err(self.closed_error());
        }
        let query = term_frequencies(text);
        let mut scored: Vec<(f64, &StoredEntry)> = state
            .entries
            .iter()
            .map(|entry| (cosine(&query, &term_frequencies(&entry.content)), entry))
            .filter(|(score, _)| *score > 0.0 && *score >= self.score_threshold)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(self.k);
        Ok(scored
            .into_iter()
            .map(|(score, entry)| {
                MemoryResult::new(entry.content.clone(), entry.metadata.clone(), score)
            })
            .collect())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        let mut state = self.state.write().await;
        if state.closed {
            return Err(self.closed_error());
        }
        self.persist(&[]).await?;
        state.entries.clear();
        Ok(())
    }

    async fn close(&self) -> Result<(), MemoryError> {
        let mut state = self.state.write().await;
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        self.persist(&state.entries).await
    }
}

impl MemoryKind for RetrievalMemory {
    async fn open(name: &str, config: &MemoryConfig) -> Result<Self, MemoryError> {
        RetrievalMemory::open(name, &config.retrieval_config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(k: usize, score_threshold: f64) -> RetrievalConfig {
        RetrievalConfig {
            k,
            score_threshold,
            persistence_path: None,
        }
    }

    #[tokio::test]
    async fn ranks_best_match_first_and_caps_at_k() {
        let memory = RetrievalMemory::new("facts", &config(2, 0.1));
        memory
            .add("The weather in Paris is rainy".into(), json!(null))
            .await
            .unwrap();
        memory
            .add("Rust has zero cost abstractions".into(), json!(null))
            .await
            .unwrap();
        memory
            .add("Paris weather forecast: rainy weather all week".into(), json!({"src": "wx"}))
            .await
            .unwrap();
        memory
            .add("The capital of France is Paris".into(), json!(null))
            .await
            .unwrap();

        let results = memory.query("weather in Paris").await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
        assert!(results.iter().all(|r| r.content.contains("weather")));
    }

    #[tokio::test]
    async fn threshold_filters_weak_matches() {
        let memory = RetrievalMemory::new("facts", &config(5, 0.9));
        memory
            .add("poems about the sea".into(), json!(null))
            .await
            .unwrap();
        memory.add("sea".into(), json!(null)).await.unwrap();

        let results = memory.query("sea").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "sea");
    }

    #[tokio::test]
    async fn unrelated_query_returns_nothing() {
        let memory = RetrievalMemory::new("facts", &config(5, 0.0));
        memory.add("alpha beta".into(), json!(null)).await.unwrap();
        assert!(memory.query("gamma").await.unwrap().is_empty());
        assert!(memory.query("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RetrievalConfig {
            persistence_path: Some(dir.path().join("store")),
            ..RetrievalConfig::default()
        };

        let memory = RetrievalMemory::open("notes", &cfg).await.unwrap();
        assert!(memory.is_empty().await);
        memory
            .add("remember the milk".into(), json!({"day": "monday"}))
            .await
            .unwrap();
        memory.close().await.unwrap();
        assert_eq!(
            memory.store_path(),
            Some(dir.path().join("store").join("notes.json").as_path())
        );

        let reopened = RetrievalMemory::open("notes", &cfg).await.unwrap();
        assert_eq!(reopened.len().await, 1);
        let results = reopened.query("milk").await.unwrap();
        assert_eq!(results[0].metadata, json!({"day": "monday"}));
    }

    #[tokio::test]
    async fn clear_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RetrievalConfig {
            persistence_path: Some(dir.path().to_path_buf()),
            ..RetrievalConfig::default()
        };
        let memory = RetrievalMemory::open("notes", &cfg).await.unwrap();
        memory.add("something".into(), json!(null)).await.unwrap();
        memory.clear().await.unwrap();

        let reopened = RetrievalMemory::open("notes", &cfg).await.unwrap();
        assert!(reopened.is_empty().await);
    }

    #[tokio::test]
    async fn failed_write_leaves_entries_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RetrievalConfig {
            persistence_path: Some(dir.path().to_path_buf()),
            ..RetrievalConfig::default()
        };
        let memory = RetrievalMemory::open("notes", &cfg).await.unwrap();
        memory.add("kept entry".into(), json!(null)).await.unwrap();

        let store = dir.path().join("notes.json");
        std::fs::remove_file(&store).unwrap();
        std::fs::create_dir(&store).unwrap();

        let err = memory.add("lost entry".into(), json!(null)).await.unwrap_err();
        assert!(matches!(err, MemoryError::Io(_)));
        assert_eq!(memory.len().await, 1);
        assert!(memory.query("lost").await.unwrap().is_empty());

        assert!(matches!(memory.clear().await, Err(MemoryError::Io(_))));
        assert_eq!(memory.query("kept").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_store_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.json"), "not json").unwrap();
        let cfg = RetrievalConfig {
            persistence_path: Some(dir.path().to_path_buf()),
            ..RetrievalConfig::default()
        };
        let err = RetrievalMemory::open("notes", &cfg).await.err().unwrap();
        assert!(matches!(err, MemoryError::Serialization(_)));
    }

    #[tokio::test]
    async fn closed_memory_rejects_operations() {
        let memory = RetrievalMemory::new("facts", &RetrievalConfig::default());
        memory.close().await.unwrap();
        assert!(matches!(
            memory.query("x").await,
            Err(MemoryError::Closed(_))
        ));
        assert!(matches!(
            memory.add("x".into(), json!(null)).await,
            Err(MemoryError::Closed(_))
        ));
        assert!(memory.close().await.is_ok());
    }

    #[test]
    fn filenames_are_encoded() {
        assert_eq!(store_filename("notes"), "notes.json");
        assert_eq!(store_filename("team/notes"), "team%2Fnotes.json");
    }
}
