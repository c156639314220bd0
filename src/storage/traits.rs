//! Core trait definitions for the key-partitioned store

use async_trait::async_trait;
use serde_json::Value;

use super::error::StorageResult;
use super::types::Partition;

/// Durable key-value persistence partitioned by [`Partition`].
///
/// Every write replaces the whole partition. Callers read, merge and write
/// back the full value, so the last writer for a partition wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Load the value stored for a partition, `None` if it was never written
    async fn get(&self, partition: &Partition) -> StorageResult<Option<Value>>;

    /// Replace the value stored for a partition
    async fn set(&self, partition: &Partition, value: Value) -> StorageResult<()>;

    /// Drop a partition entirely
    async fn remove(&self, partition: &Partition) -> StorageResult<()>;
}
