//! File-based store backend

use async_trait::async_trait;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::storage::{
    error::{StorageError, StorageResult},
    traits::KeyValueStore,
    types::Partition,
};

/// Stores every partition as one JSON document under
/// `<base_dir>/<namespace>/<sha256(key)>.json`.
pub struct FileStore {
    base_dir: PathBuf,
    protected: bool,
}

impl FileStore {
    /// Create a store for plain settings and history
    pub async fn new(base_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        Self::create(base_dir.into(), false).await
    }

    /// Create a store whose directories and files are readable by the owner only
    pub async fn protected(base_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        Self::create(base_dir.into(), true).await
    }

    async fn create(base_dir: PathBuf, protected: bool) -> StorageResult<Self> {
        fs::create_dir_all(&base_dir).await?;
        let store = Self {
            base_dir,
            protected,
        };
        store.restrict_dir(&store.base_dir).await?;
        Ok(store)
    }

    /// File holding a partition's document
    pub fn path_for(&self, partition: &Partition) -> PathBuf {
        self.base_dir
            .join(partition.namespace.as_str())
            .join(format!("{}.json", partition.digest()))
    }

    async fn ensure_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
            self.restrict_dir(parent).await?;
        }
        Ok(())
    }

    #[cfg(unix)]
    async fn restrict_dir(&self, path: &Path) -> StorageResult<()> {
        use std::os::unix::fs::PermissionsExt;

        if !self.protected {
            return Ok(());
        }
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o700)).await?;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn restrict_dir(&self, _path: &Path) -> StorageResult<()> {
        Ok(())
    }
}

/// Write through a uniquely named sibling temp file, then rename it over the
/// target. Temp files are created owner-only (0600 on unix).
fn write_atomically(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::Builder::new()
        .prefix(".partition-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, partition: &Partition) -> StorageResult<Option<Value>> {
        let path = self.path_for(partition);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let value = serde_json::from_str(&content).map_err(|e| {
            StorageError::serialization(format!(
                "corrupt partition {} at {}: {}",
                partition,
                path.display(),
                e
            ))
        })?;
        Ok(Some(value))
    }

    async fn set(&self, partition: &Partition, value: Value) -> StorageResult<()> {
        let path = self.path_for(partition);
        self.ensure_dir(&path).await?;

        let content = serde_json::to_vec_pretty(&value)?;
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&target, &content))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        tracing::trace!("Persisted partition {} to {}", partition, path.display());
        Ok(())
    }

    async fn remove(&self, partition: &Partition) -> StorageResult<()> {
        let path = self.path_for(partition);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::Namespace;
    use serde_json::json;
    use tempfile::TempDir;

    fn partition(category: &str) -> Partition {
        Partition::new(Namespace::Settings, Path::new("/repo"), Some(category))
    }

    #[tokio::test]
    async fn test_get_missing_partition_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).await.unwrap();

        assert!(store.get(&partition("variables")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_then_get_replaces_whole_partition() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).await.unwrap();
        let key = partition("variables");

        store.set(&key, json!([{"name": "A"}])).await.unwrap();
        store.set(&key, json!([{"name": "B"}])).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Some(json!([{"name": "B"}])));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).await.unwrap();
        let key = partition("inputs");

        store.set(&key, json!([])).await.unwrap();
        store.remove(&key).await.unwrap();
        store.remove(&key).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_partition_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).await.unwrap();
        let key = partition("runners");
        let path = store.path_for(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let err = store.get(&key).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_protected_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::protected(temp_dir.path().join("secure"))
            .await
            .unwrap();
        let key = partition("secrets");
        store.set(&key, json!([{"name": "TOKEN"}])).await.unwrap();

        let mode = std::fs::metadata(store.path_for(&key))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_concurrent_writers_leave_a_whole_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(FileStore::new(temp_dir.path()).await.unwrap());
        let key = partition("variables");

        let writes = (0..16).map(|i| {
            let store = store.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let entries: Vec<_> = (0..50).map(|n| json!({"name": format!("V{i}_{n}")})).collect();
                store.set(&key, Value::Array(entries)).await
            })
        });
        for result in futures::future::join_all(writes).await {
            result.unwrap().unwrap();
        }

        let stored = store.get(&key).await.unwrap().unwrap();
        assert_eq!(stored.as_array().unwrap().len(), 50);

        let leftovers: Vec<_> = std::fs::read_dir(store.path_for(&key).parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
