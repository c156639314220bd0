//! Partition keys for the store

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Top-level grouping of persisted data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Settings,
    SettingFiles,
    Options,
    History,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Settings => "settings",
            Namespace::SettingFiles => "setting-files",
            Namespace::Options => "options",
            Namespace::History => "history",
        }
    }
}

/// Key of one persisted partition: `{namespace, workspace folder, category}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    pub namespace: Namespace,
    pub folder: PathBuf,
    pub category: Option<String>,
}

impl Partition {
    pub fn new(namespace: Namespace, folder: &Path, category: Option<&str>) -> Self {
        Self {
            namespace,
            folder: folder.to_path_buf(),
            category: category.map(str::to_string),
        }
    }

    /// Stable string form of the key
    pub fn key(&self) -> String {
        match &self.category {
            Some(category) => format!(
                "{}:{}:{}",
                self.namespace.as_str(),
                category,
                self.folder.display()
            ),
            None => format!("{}:{}", self.namespace.as_str(), self.folder.display()),
        }
    }

    /// Filesystem-safe digest of the key
    pub fn digest(&self) -> String {
        hash_hex(&self.key())
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Hex-encoded sha256 of a string
pub fn hash_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    format!("{:x}", digest)
}

/// Short digest identifying a workspace folder on disk (log directories etc.)
pub fn folder_digest(folder: &Path) -> String {
    let mut digest = hash_hex(&folder.display().to_string());
    digest.truncate(16);
    digest
}
