//! Per-partition write serialization
//!
//! Read-merge-write cycles on the same partition must not interleave within
//! one process. Writers in other processes are not coordinated.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::types::Partition;

/// One async mutex per partition key, created on first use
#[derive(Clone, Default)]
pub struct PartitionLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl PartitionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other holder works on `partition`
    pub async fn lock(&self, partition: &Partition) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(partition.key()).or_default())
        };
        lock.lock_owned().await
    }
}
