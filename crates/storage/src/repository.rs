use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
///
/// These are never retried by the store; callers decide what to do.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Durable string-keyed medium the versioned store persists into.
///
/// Every `write` replaces the whole value for a key in one step, so readers
/// never observe a partially written record.
#[async_trait]
pub trait KeyValueMedium: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be read.
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium rejects the write.
    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be updated.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove several keys.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be updated.
    async fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// In-memory medium for tests and prototyping.
///
/// An optional byte limit makes oversized writes fail the way a full browser
/// store would.
#[derive(Clone, Default)]
pub struct InMemoryMedium {
    entries: Arc<Mutex<HashMap<String, String>>>,
    limit_bytes: Option<usize>,
}

impl InMemoryMedium {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            limit_bytes: None,
        }
    }

    /// Medium that rejects writes once the total stored size would exceed `limit_bytes`.
    #[must_use]
    pub fn with_limit(limit_bytes: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            limit_bytes: Some(limit_bytes),
        }
    }

    /// Raw value currently stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }
}

#[async_trait]
impl KeyValueMedium for InMemoryMedium {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.raw(key)
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if let Some(limit) = self.limit_bytes {
            let others: usize = guard
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Holds the medium behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub medium: Arc<dyn KeyValueMedium>,
}

impl Storage {
    #[must_use]
    pub fn from_medium(medium: Arc<dyn KeyValueMedium>) -> Self {
        Self { medium }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_replaces_and_remove_clears() {
        let medium = InMemoryMedium::new();
        medium.write("k", "one").await.unwrap();
        medium.write("k", "two").await.unwrap();
        assert_eq!(medium.read("k").await.unwrap().as_deref(), Some("two"));

        medium.remove("k").await.unwrap();
        medium.remove("k").await.unwrap();
        assert!(medium.read("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_all_clears_listed_keys_only() {
        let medium = InMemoryMedium::new();
        medium.write("a", "1").await.unwrap();
        medium.write("b", "2").await.unwrap();
        medium.write("c", "3").await.unwrap();

        medium.remove_all(&["a", "b"]).await.unwrap();
        assert!(medium.read("a").await.unwrap().is_none());
        assert!(medium.read("b").await.unwrap().is_none());
        assert_eq!(medium.read("c").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn limited_medium_rejects_oversized_write_and_keeps_old_value() {
        let medium = InMemoryMedium::with_limit(10);
        medium.write("k", "small").await.unwrap();

        let err = medium.write("k", "far too large").await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 10, .. }));
        assert_eq!(medium.read("k").await.unwrap().as_deref(), Some("small"));
    }
}
