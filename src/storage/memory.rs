// src/storage/memory.rs

// In-memory storage (for testing and ephemeral clients).
// Nothing survives the process, so a fresh instance always starts on the primary.
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::config::InMemoryConfig;
use crate::error::{FailoverError, Result, StorageError};
use crate::storage::StorageBackend;
use crate::storage_op;

/// In-memory storage backend implementation
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    config: InMemoryConfig,
}

impl MemoryStorage {
    /// Creates a new in-memory storage with the given configuration
    pub fn new(config: InMemoryConfig) -> Self {
        let data = Arc::new(RwLock::new(HashMap::with_capacity(
            config.max_entries.min(64),
        )));

        Self { data, config }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().map(|data| data.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(InMemoryConfig::default())
    }
}

fn poisoned() -> FailoverError {
    FailoverError::Storage(StorageError::Unavailable(
        "memory storage lock poisoned".to_string(),
    ))
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    type Config = InMemoryConfig;

    async fn new(config: Self::Config) -> Result<Self> {
        Ok(Self::new(config))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let data = self.data.read().map_err(|_| poisoned())?;
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let started = Instant::now();
        let result = {
            let mut data = self.data.write().map_err(|_| poisoned())?;

            // Apply max entries limit
            if data.len() >= self.config.max_entries && !data.contains_key(key) {
                Err(FailoverError::Storage(StorageError::Unavailable(
                    "Maximum entries limit exceeded".to_string(),
                )))
            } else {
                data.insert(key.to_string(), value.to_vec());
                Ok(())
            }
        };

        storage_op!("memory", "set", key, result, started.elapsed().as_millis() as u64);
        result
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let data = self.data.read().map_err(|_| poisoned())?;
        Ok(data.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut data = self.data.write().map_err(|_| poisoned())?;
        Ok(data.remove(key).is_some())
    }
}
