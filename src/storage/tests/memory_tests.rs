#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tokio::time;

    use crate::config::InMemoryConfig;
    use crate::error::{FailoverError, StorageError};
    use crate::storage::{MemoryStorage, StorageBackend};

    use super::super::common;

    // Helper function to create a MemoryStorage instance for testing
    fn create_test_memory() -> MemoryStorage {
        MemoryStorage::new(InMemoryConfig { max_entries: 1000 })
    }

    #[tokio::test]
    async fn test_memory_basic_operations() {
        let memory = create_test_memory();

        let result = time::timeout(
            Duration::from_secs(5),
            common::test_basic_operations(&memory),
        )
        .await;

        assert!(result.is_ok(), "Basic operations timed out");
        assert!(result.unwrap().is_ok(), "Basic memory operations failed");
    }

    #[tokio::test]
    async fn test_memory_concurrent_writes() {
        let memory = create_test_memory();

        let result = common::test_concurrent_writes(&memory).await;
        assert!(result.is_ok(), "Concurrent writes failed: {:?}", result);
        assert_eq!(memory.len(), 16);
    }

    #[tokio::test]
    async fn test_memory_capacity_limit() {
        let small_memory = MemoryStorage::new(InMemoryConfig { max_entries: 2 });

        small_memory.set("a", b"1").await.unwrap();
        small_memory.set("b", b"2").await.unwrap();

        // Overwriting an existing key is always allowed
        small_memory.set("a", b"3").await.unwrap();

        let overflow_result = small_memory.set("c", b"overflow").await;
        match overflow_result {
            Err(FailoverError::Storage(StorageError::Unavailable(msg))) => {
                assert!(msg.contains("Maximum entries"), "Error should mention capacity limit");
            }
            other => panic!("Expected Unavailable error, got {:?}", other),
        }
    }

    #[test]
    fn test_clones_share_data() {
        let memory = create_test_memory();
        let clone = memory.clone();

        tokio_test::block_on(async {
            memory.set("shared", b"yes").await.unwrap();
            assert_eq!(clone.get("shared").await.unwrap(), Some(b"yes".to_vec()));
        });
    }
}
