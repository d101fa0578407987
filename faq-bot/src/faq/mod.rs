//! FAQ entries and the storage seam the wizard and lookup handler work against.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub classification: String,
}

#[derive(Error, Debug)]
pub enum FaqError {
    #[error("FAQ entry {0} not found")]
    NotFound(i64),

    #[error("FAQ seed IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FAQ seed is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait FaqStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Entry>, FaqError>;

    /// Case-insensitive match on the trimmed key.
    async fn find_by_key(&self, key: &str) -> Result<Option<Entry>, FaqError>;

    /// Replaces classification and value of an existing entry.
    async fn update(&self, id: i64, classification: &str, value: &str) -> Result<Entry, FaqError>;

    /// All entries ordered by id.
    async fn list(&self) -> Result<Vec<Entry>, FaqError>;
}

#[derive(Default)]
pub struct InMemoryFaqStore {
    entries: RwLock<HashMap<i64, Entry>>,
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

impl InMemoryFaqStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().map(|e| (e.id, e)).collect()),
        }
    }

    /// Loads a JSON array of entries.
    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, FaqError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let entries: Vec<Entry> = serde_json::from_str(&raw)?;
        info!(path = %path.as_ref().display(), count = entries.len(), "FAQ seed loaded");
        Ok(Self::with_entries(entries))
    }
}

#[async_trait]
impl FaqStore for InMemoryFaqStore {
    async fn get(&self, id: i64) -> Result<Option<Entry>, FaqError> {
        Ok(self.entries.read().await.get(&id).cloned())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Entry>, FaqError> {
        let wanted = normalize_key(key);
        if wanted.is_empty() {
            return Ok(None);
        }
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|e| normalize_key(&e.key) == wanted)
            .min_by_key(|e| e.id)
            .cloned())
    }

    async fn update(&self, id: i64, classification: &str, value: &str) -> Result<Entry, FaqError> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&id).ok_or(FaqError::NotFound(id))?;
        entry.classification = classification.to_string();
        entry.value = value.to_string();
        Ok(entry.clone())
    }

    async fn list(&self) -> Result<Vec<Entry>, FaqError> {
        let mut all: Vec<Entry> = self.entries.read().await.values().cloned().collect();
        all.sort_by_key(|e| e.id);
        Ok(all)
    }
}
