// src/storage/file.rs

// Durable storage backed by a small JSON document on disk.
// Values must be UTF-8; the file is meant to stay human readable.
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::FileStorageConfig;
use crate::error::{FailoverError, Result, StorageError};
use crate::storage::StorageBackend;
use crate::storage_op;

#[derive(Debug)]
struct FileInner {
    path: PathBuf,
    /// Last state successfully written to (or loaded from) disk
    data: RwLock<BTreeMap<String, String>>,
    /// Serializes writers so two updates never race on the temp file
    write_lock: Mutex<()>,
}

/// Storage backend that persists every write to a JSON file
#[derive(Debug, Clone)]
pub struct FileStorage {
    inner: Arc<FileInner>,
}

impl FileStorage {
    /// Opens the store at `config.path`.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// logged and treated as empty; it is replaced on the next write.
    pub async fn open(config: FileStorageConfig) -> Result<Self> {
        let data = match fs::read(&config.path).await {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, String>>(&bytes) {
                Ok(map) => {
                    debug!(path = %config.path.display(), keys = map.len(), "Loaded state file");
                    map
                }
                Err(e) => {
                    warn!(
                        path = %config.path.display(),
                        error = %e,
                        "State file is corrupt, starting empty"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(FailoverError::Storage(StorageError::Io(format!(
                    "cannot read {}: {}",
                    config.path.display(),
                    e
                ))))
            }
        };

        Ok(Self {
            inner: Arc::new(FileInner {
                path: config.path,
                data: RwLock::new(data),
                write_lock: Mutex::new(()),
            }),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        let data = self.inner.data.read().map_err(|_| poisoned())?;
        Ok(data.clone())
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.inner.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    /// Writes `next` to disk atomically, then publishes it to readers
    async fn persist(&self, next: BTreeMap<String, String>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&next)?;

        if let Some(parent) = self.inner.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(io_error)?;
            }
        }

        let tmp = self.temp_path();
        fs::write(&tmp, &bytes).await.map_err(io_error)?;
        fs::rename(&tmp, &self.inner.path).await.map_err(io_error)?;

        let mut data = self.inner.data.write().map_err(|_| poisoned())?;
        *data = next;
        Ok(())
    }
}

fn poisoned() -> FailoverError {
    FailoverError::Storage(StorageError::Unavailable(
        "file storage lock poisoned".to_string(),
    ))
}

fn io_error(err: std::io::Error) -> FailoverError {
    FailoverError::Storage(StorageError::Io(err.to_string()))
}

#[async_trait]
impl StorageBackend for FileStorage {
    type Config = FileStorageConfig;

    async fn new(config: Self::Config) -> Result<Self> {
        Self::open(config).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let data = self.inner.data.read().map_err(|_| poisoned())?;
        Ok(data.get(key).map(|value| value.as_bytes().to_vec()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let value = std::str::from_utf8(value).map_err(|e| {
            FailoverError::Storage(StorageError::Serialization(format!(
                "value for '{}' is not UTF-8: {}",
                key, e
            )))
        })?;

        let started = Instant::now();
        let _guard = self.inner.write_lock.lock().await;

        let mut next = self.snapshot()?;
        next.insert(key.to_string(), value.to_string());
        let result = self.persist(next).await;

        storage_op!("file", "set", key, result, started.elapsed().as_millis() as u64);
        result
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let data = self.inner.data.read().map_err(|_| poisoned())?;
        Ok(data.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let _guard = self.inner.write_lock.lock().await;

        let mut next = self.snapshot()?;
        if next.remove(key).is_none() {
            return Ok(false);
        }
        self.persist(next).await?;
        Ok(true)
    }
}
