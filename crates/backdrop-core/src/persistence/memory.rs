//! In-process key-value store.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::KeyValueStore;
use crate::error::StorageResult;

/// Non-durable store for tests and embedders that keep nothing across runs.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Current value of `key`, without going through the async interface.
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn erase(&self, key: &str) -> StorageResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_erase() {
        let store = MemoryKeyValueStore::new();
        assert!(store.get("bg").await.unwrap().is_none());

        store.set("bg", vec![1, 2]).await.unwrap();
        store.set("bg", vec![3]).await.unwrap();
        assert_eq!(store.get("bg").await.unwrap(), Some(vec![3]));
        assert_eq!(store.len(), 1);

        store.erase("bg").await.unwrap();
        store.erase("bg").await.unwrap();
        assert!(store.is_empty());
    }
}
