//! In-memory key-value store.
//!
//! Entries live for the lifetime of the process; useful for tests and for
//! hosts without a writable cache directory.

use async_trait::async_trait;
use dashmap::DashMap;

use super::KeyValueStore;
use crate::error::CacheIoError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, CacheIoError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), CacheIoError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), CacheIoError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheIoError> {
        Ok(self.entries.iter().map(|entry| entry.key().clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set_item("a", "1".into()).await.unwrap();
        store.set_item("a", "2".into()).await.unwrap();
        assert_eq!(store.get_item("a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.len(), 1);

        store.remove_item("a").await.unwrap();
        store.remove_item("a").await.unwrap();
        assert!(store.get_item("a").await.unwrap().is_none());
    }
}
