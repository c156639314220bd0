//! Persistence layer for settings and run history
//!
//! Data is partitioned by `{namespace, workspace folder, category}`. Secrets
//! live in a separate protected store; everything else shares the plain one.

pub mod backends;
pub mod error;
pub mod lock;
pub mod traits;
pub mod types;

pub use backends::{FileStore, MemoryStore};
pub use error::{StorageError, StorageResult};
pub use lock::PartitionLocks;
pub use traits::KeyValueStore;
pub use types::{folder_digest, hash_hex, Namespace, Partition};

use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;

/// The pair of stores the engine writes to
#[derive(Clone)]
pub struct StoreSet {
    plain: Arc<dyn KeyValueStore>,
    protected: Arc<dyn KeyValueStore>,
}

impl StoreSet {
    pub fn new(plain: Arc<dyn KeyValueStore>, protected: Arc<dyn KeyValueStore>) -> Self {
        Self { plain, protected }
    }

    /// Open file-backed stores under a state directory
    pub async fn open(state_dir: &Path) -> StorageResult<Self> {
        let plain = FileStore::new(state_dir.join("state")).await?;
        let protected = FileStore::protected(state_dir.join("secrets")).await?;
        tracing::debug!("Opened stores under {}", state_dir.display());
        Ok(Self::new(Arc::new(plain), Arc::new(protected)))
    }

    /// Both stores kept in memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn store(&self, protected: bool) -> &dyn KeyValueStore {
        if protected {
            self.protected.as_ref()
        } else {
            self.plain.as_ref()
        }
    }

    /// Load a typed list, empty when the partition was never written
    pub async fn load_list<T: DeserializeOwned>(
        &self,
        partition: &Partition,
        protected: bool,
    ) -> StorageResult<Vec<T>> {
        self.load(partition, protected)
            .await
            .map(Option::unwrap_or_default)
    }

    /// Load a typed value
    pub async fn load<T: DeserializeOwned>(
        &self,
        partition: &Partition,
        protected: bool,
    ) -> StorageResult<Option<T>> {
        match self.store(protected).get(partition).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StorageError::serialization(format!("{}: {}", partition, e))),
            None => Ok(None),
        }
    }

    /// Replace a partition with a typed value
    pub async fn save<T: Serialize + ?Sized>(
        &self,
        partition: &Partition,
        value: &T,
        protected: bool,
    ) -> StorageResult<()> {
        let value = serde_json::to_value(value)?;
        self.store(protected).set(partition, value).await
    }

    /// Replace a partition with a list. An empty list drops the partition so
    /// no empty documents accumulate; it reads back as empty either way.
    pub async fn save_list<T: Serialize>(
        &self,
        partition: &Partition,
        entries: &[T],
        protected: bool,
    ) -> StorageResult<()> {
        if entries.is_empty() {
            return self.store(protected).remove(partition).await;
        }
        self.save(partition, entries, protected).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Entry {
        name: String,
    }

    #[tokio::test]
    async fn test_protected_and_plain_stores_are_separate() {
        let stores = StoreSet::in_memory();
        let partition = Partition::new(Namespace::Settings, Path::new("/repo"), Some("secrets"));
        let entries = vec![Entry {
            name: "TOKEN".to_string(),
        }];

        stores.save(&partition, &entries, true).await.unwrap();

        let protected: Vec<Entry> = stores.load_list(&partition, true).await.unwrap();
        let plain: Vec<Entry> = stores.load_list(&partition, false).await.unwrap();
        assert_eq!(protected, entries);
        assert!(plain.is_empty());
    }

    #[tokio::test]
    async fn test_empty_list_drops_partition() {
        let stores = StoreSet::in_memory();
        let partition = Partition::new(Namespace::Settings, Path::new("/repo"), Some("inputs"));
        let entries = vec![Entry {
            name: "target".to_string(),
        }];

        stores.save_list(&partition, &entries, false).await.unwrap();
        assert!(stores.store(false).get(&partition).await.unwrap().is_some());

        stores.save_list::<Entry>(&partition, &[], false).await.unwrap();
        assert!(stores.store(false).get(&partition).await.unwrap().is_none());
        let reloaded: Vec<Entry> = stores.load_list(&partition, false).await.unwrap();
        assert!(reloaded.is_empty());
    }

    #[tokio::test]
    async fn test_load_wrong_shape_is_serialization_error() {
        let stores = StoreSet::in_memory();
        let partition = Partition::new(Namespace::Options, Path::new("/repo"), None);
        stores
            .store(false)
            .set(&partition, serde_json::json!({"unexpected": true}))
            .await
            .unwrap();

        let err = stores.load_list::<Entry>(&partition, false).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
