//! 内存存储（默认实现，也用于测试）

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{KvStore, StorageError};

/// 内存键值存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.inner.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.get("missing").await.unwrap().is_none());

        store.set("key", json!({"n": 42})).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some(json!({"n": 42})));

        store.set("key", json!({"n": 43})).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some(json!({"n": 43})));

        store.remove("key").await.unwrap();
        assert!(store.get("key").await.unwrap().is_none());

        // remove 幂等
        store.remove("key").await.unwrap();
    }
}
