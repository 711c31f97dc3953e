// src/storage/tests/mod.rs

mod memory_tests;

// Common utilities for storage tests
pub(crate) mod common {
    use crate::error::Result;
    use crate::storage::StorageBackend;

    // Test basic storage operations that should work on any backend
    pub async fn test_basic_operations<S: StorageBackend>(storage: &S) -> Result<()> {
        let key = "test_basic_key";
        let value: &[u8] = b"test_value";

        // Missing keys read as None
        assert_eq!(storage.get(key).await?, None);
        assert!(!storage.exists(key).await?);

        storage.set(key, value).await?;

        let result = storage.get(key).await?;
        assert_eq!(result.as_deref(), Some(value));
        assert!(storage.exists(key).await?);

        // Overwrite keeps a single entry with the latest value
        storage.set(key, b"second").await?;
        assert_eq!(storage.get(key).await?.as_deref(), Some(&b"second"[..]));

        // Test delete
        assert!(storage.delete(key).await?);
        assert!(!storage.exists(key).await?);

        // Deleting again reports nothing removed
        assert!(!storage.delete(key).await?);

        Ok(())
    }

    // Concurrent writers to distinct keys must all land
    pub async fn test_concurrent_writes<S: StorageBackend + Clone + 'static>(
        storage: &S,
    ) -> Result<()> {
        let mut handles = Vec::new();
        for i in 0..16 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("concurrent_{}", i);
                storage.set(&key, i.to_string().as_bytes()).await
            }));
        }

        for handle in handles {
            handle
                .await
                .map_err(|e| crate::error::FailoverError::Internal(e.to_string()))??;
        }

        for i in 0..16 {
            let key = format!("concurrent_{}", i);
            let value = storage.get(&key).await?;
            assert_eq!(value, Some(i.to_string().into_bytes()));
        }

        Ok(())
    }
}
