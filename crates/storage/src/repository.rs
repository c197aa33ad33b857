use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),
}

/// The fixed logical keys progress is persisted under.
///
/// Each key holds one independently written JSON document, so a torn write
/// can leave them out of step with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressKey {
    CurrentQuestionIndex,
    UserStats,
    WrongQuestionIds,
}

impl ProgressKey {
    pub const ALL: [ProgressKey; 3] = [
        ProgressKey::CurrentQuestionIndex,
        ProgressKey::UserStats,
        ProgressKey::WrongQuestionIds,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressKey::CurrentQuestionIndex => "current-question-index",
            ProgressKey::UserStats => "user-stats",
            ProgressKey::WrongQuestionIds => "wrong-question-ids",
        }
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable string storage addressed by [`ProgressKey`].
///
/// Values are opaque to the repository; encoding and decoding belong to the
/// caller.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. A missing key is
    /// `Ok(None)`, not an error.
    async fn load(&self, key: ProgressKey) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the write.
    async fn save(&self, key: ProgressKey, value: &str) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<ProgressKey, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Seed a raw value, bypassing any encoding. Useful for simulating data
    /// written by older versions or corrupted by hand.
    #[must_use]
    pub fn with_raw(self, key: ProgressKey, value: impl Into<String>) -> Self {
        if let Ok(mut guard) = self.entries.lock() {
            guard.insert(key, value.into());
        }
        self
    }

    /// Raw value currently stored under `key`.
    #[must_use]
    pub fn raw(&self, key: ProgressKey) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|guard| guard.get(&key).cloned())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load(&self, key: ProgressKey) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    async fn save(&self, key: ProgressKey, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key, value.to_owned());
        Ok(())
    }
}

/// Repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_use_fixed_names() {
        let names: Vec<_> = ProgressKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec!["current-question-index", "user-stats", "wrong-question-ids"]
        );
    }

    #[tokio::test]
    async fn missing_key_loads_as_none() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.load(ProgressKey::UserStats).await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_overwrites_per_key() {
        let repo = InMemoryRepository::new().with_raw(ProgressKey::CurrentQuestionIndex, "3");
        repo.save(ProgressKey::CurrentQuestionIndex, "4").await.unwrap();
        repo.save(ProgressKey::WrongQuestionIds, "[7]").await.unwrap();

        assert_eq!(
            repo.load(ProgressKey::CurrentQuestionIndex).await.unwrap().as_deref(),
            Some("4")
        );
        assert_eq!(repo.raw(ProgressKey::WrongQuestionIds).as_deref(), Some("[7]"));
        assert_eq!(repo.raw(ProgressKey::UserStats), None);
    }

    #[tokio::test]
    async fn storage_in_memory_is_usable_through_trait_object() {
        let storage = Storage::in_memory();
        storage.progress.save(ProgressKey::UserStats, "{}").await.unwrap();
        let loaded = storage.progress.load(ProgressKey::UserStats).await.unwrap();
        assert_eq!(loaded.as_deref(), Some("{}"));
    }
}
