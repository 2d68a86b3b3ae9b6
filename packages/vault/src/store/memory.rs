//! In-memory store for tests and embedding

use super::{ConfigStore, StoreResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent in-memory [`ConfigStore`]
///
/// Clones share the same underlying map. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|value| value.clone()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_put_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("config/a").await.unwrap(), None);

        store.put("config/a", b"one".to_vec()).await.unwrap();
        store.put("config/a", b"two".to_vec()).await.unwrap();
        assert_eq!(store.get("config/a").await.unwrap(), Some(b"two".to_vec()));
        assert!(store.exists("config/a").await.unwrap());
        assert_eq!(store.len(), 1);

        store.delete("config/a").await.unwrap();
        assert!(store.is_empty());

        // Deleting again is a no-op
        store.delete("config/a").await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let clone = store.clone();
        clone.put("public_keya", b"pem".to_vec()).await.unwrap();
        assert_eq!(store.keys(), vec!["public_keya".to_string()]);
    }
}
