// src/state/mod.rs
//! Durable record of which API server is active.
//!
//! The record has two fields: the active server and the time of the last
//! recovery probe against the primary. It is advisory. A failed request may
//! override it at any moment, so readers never fail: a missing, unreadable or
//! corrupt value reads as its default.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;
use tracing::warn;

use crate::error::{FailoverError, Result, StorageError};
use crate::storage::StorageBackend;


/// One of the two configured API servers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    #[default]
    Primary,
    Backup,
}

impl ServerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerKind::Primary => "primary",
            ServerKind::Backup => "backup",
        }
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerKind {
    type Err = FailoverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "primary" => Ok(ServerKind::Primary),
            "backup" => Ok(ServerKind::Backup),
            other => Err(FailoverError::Storage(StorageError::Corrupt(format!(
                "unknown server kind '{}'",
                other
            )))),
        }
    }
}

/// Both state fields, read together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailoverSnapshot {
    pub active_server: ServerKind,
    /// Epoch milliseconds, `0` when the primary was never probed
    pub last_primary_recovery_check: i64,
}

/// Server selector contract used by the interceptor
#[async_trait]
pub trait StateStore: Send + Sync + Debug {
    /// Currently active server, `Primary` when unset
    async fn active_server(&self) -> ServerKind;

    async fn set_active_server(&self, server: ServerKind) -> Result<()>;

    /// Epoch milliseconds of the last recovery probe, `0` when unset
    async fn last_primary_recovery_check(&self) -> i64;

    async fn set_last_primary_recovery_check(&self, timestamp_millis: i64) -> Result<()>;

    /// Forget both fields, returning to first-run defaults
    async fn reset(&self) -> Result<()>;

    async fn snapshot(&self) -> FailoverSnapshot {
        FailoverSnapshot {
            active_server: self.active_server().await,
            last_primary_recovery_check: self.last_primary_recovery_check().await,
        }
    }
}

/// `StateStore` kept in a key-value storage backend
#[derive(Debug, Clone)]
pub struct StoredState<S>
where
    S: StorageBackend,
{
    storage: S,
    active_key: String,
    check_key: String,
}

impl<S> StoredState<S>
where
    S: StorageBackend,
{
    /// Creates a store whose keys live under `key_prefix`
    pub fn new(storage: S, key_prefix: &str) -> Self {
        Self {
            storage,
            active_key: format!("{}:active_server", key_prefix),
            check_key: format!("{}:last_primary_check", key_prefix),
        }
    }

    /// The underlying storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    async fn read_string(&self, key: &str) -> Option<String> {
        match self.storage.get(key).await {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(key = key, "Stored value is not UTF-8, using default");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = key, error = %e, "State read failed, using default");
                None
            }
        }
    }
}

#[async_trait]
impl<S> StateStore for StoredState<S>
where
    S: StorageBackend,
{
    async fn active_server(&self) -> ServerKind {
        match self.read_string(&self.active_key).await {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(key = %self.active_key, error = %e, "Corrupt active server, using primary");
                ServerKind::Primary
            }),
            None => ServerKind::Primary,
        }
    }

    async fn set_active_server(&self, server: ServerKind) -> Result<()> {
        self.storage
            .set(&self.active_key, server.as_str().as_bytes())
            .await
    }

    async fn last_primary_recovery_check(&self) -> i64 {
        match self.read_string(&self.check_key).await {
            Some(raw) => raw.trim().parse::<i64>().unwrap_or_else(|e| {
                warn!(key = %self.check_key, error = %e, "Corrupt recovery timestamp, using 0");
                0
            }),
            None => 0,
        }
    }

    async fn set_last_primary_recovery_check(&self, timestamp_millis: i64) -> Result<()> {
        self.storage
            .set(&self.check_key, timestamp_millis.to_string().as_bytes())
            .await
    }

    async fn reset(&self) -> Result<()> {
        self.storage.delete(&self.active_key).await?;
        self.storage.delete(&self.check_key).await?;
        Ok(())
    }
}
