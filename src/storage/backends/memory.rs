//! In-memory store backend for testing and dry runs

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{error::StorageResult, traits::KeyValueStore, types::Partition};

/// In-memory store; clones share the same map
#[derive(Clone, Default)]
pub struct MemoryStore {
    partitions: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, partition: &Partition) -> StorageResult<Option<Value>> {
        Ok(self.partitions.read().await.get(&partition.key()).cloned())
    }

    async fn set(&self, partition: &Partition, value: Value) -> StorageResult<()> {
        self.partitions.write().await.insert(partition.key(), value);
        Ok(())
    }

    async fn remove(&self, partition: &Partition) -> StorageResult<()> {
        self.partitions.write().await.remove(&partition.key());
        Ok(())
    }
}
