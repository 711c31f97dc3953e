// src/storage/mod.rs

pub mod file;
pub mod memory;

#[cfg(test)]
mod tests;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// Core trait that all storage backends must implement.
///
/// Every individual operation is atomic with respect to the others. No
/// multi-key transactions are offered.
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    type Config: Send + Sync;

    /// Opens the backend described by `config`
    async fn new(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Raw bytes stored under `key`, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Inserts or overwrites `key`
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Removes `key`; true when something was removed
    async fn delete(&self, key: &str) -> Result<bool>;
}
