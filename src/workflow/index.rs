//! Workflow discovery for workspace folders

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::Workflow;
use crate::{Error, Result};

/// Conventional location of workflow files, relative to a workspace folder
pub const DEFAULT_WORKFLOWS_DIR: &str = ".github/workflows";

const EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Scans `<folder>/<workflows_dir>/*.{yml,yaml}`
#[derive(Debug, Clone)]
pub struct WorkflowIndex {
    workflows_dir: PathBuf,
}

impl Default for WorkflowIndex {
    fn default() -> Self {
        Self::new(DEFAULT_WORKFLOWS_DIR)
    }
}

impl WorkflowIndex {
    pub fn new(workflows_dir: impl Into<PathBuf>) -> Self {
        Self {
            workflows_dir: workflows_dir.into(),
        }
    }

    pub fn workflows_dir(&self, folder: &Path) -> PathBuf {
        folder.join(&self.workflows_dir)
    }

    /// Parse every workflow file in a folder, sorted by path.
    ///
    /// Unreadable or unparseable files are returned with an error instead
    /// of aborting the scan.
    pub async fn scan(&self, folder: &Path) -> Result<Vec<Workflow>> {
        let paths = self.workflow_paths(folder)?;
        let mut workflows = Vec::with_capacity(paths.len());

        for path in paths {
            let workflow = match fs::read_to_string(&path).await {
                Ok(text) => Workflow::from_text(&path, text),
                Err(e) => Workflow::failed(&path, format!("Failed to read workflow file: {e}")),
            };

            if let Some(error) = workflow.error() {
                warn!("Workflow {} could not be parsed: {}", path.display(), error);
            }
            workflows.push(workflow);
        }

        debug!(
            "Scanned {} workflow(s) in {}",
            workflows.len(),
            folder.display()
        );
        Ok(workflows)
    }

    /// Scan several workspace folders
    pub async fn scan_all(&self, folders: &[PathBuf]) -> Result<BTreeMap<PathBuf, Vec<Workflow>>> {
        let mut result = BTreeMap::new();
        for folder in folders {
            result.insert(folder.clone(), self.scan(folder).await?);
        }
        Ok(result)
    }

    /// Find one workflow by file path (absolute or relative to the folder)
    /// or by bare file name
    pub async fn find(&self, folder: &Path, path: &Path) -> Result<Workflow> {
        let wanted = if path.is_absolute() {
            path.to_path_buf()
        } else {
            folder.join(path)
        };
        let bare_name = (path.components().count() == 1).then(|| path.as_os_str());

        self.scan(folder)
            .await?
            .into_iter()
            .find(|workflow| {
                workflow.path == wanted
                    || (bare_name.is_some() && workflow.path.file_name() == bare_name)
            })
            .ok_or_else(|| Error::NotFound(format!("workflow {}", path.display())))
    }

    fn workflow_paths(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let dir = self.workflows_dir(folder);
        if !dir.is_dir() {
            debug!("No workflows directory at {}", dir.display());
            return Ok(Vec::new());
        }

        let escaped = glob::Pattern::escape(&dir.to_string_lossy());
        let mut paths = Vec::new();
        for extension in EXTENSIONS {
            let pattern = format!("{escaped}/*.{extension}");
            let entries = glob::glob(&pattern)
                .map_err(|e| Error::Workflow(format!("Invalid workflow pattern {pattern}: {e}")))?;

            for entry in entries {
                match entry {
                    Ok(path) if path.is_file() => paths.push(path),
                    Ok(_) => {}
                    Err(e) => warn!("Skipping unreadable workflow entry: {}", e),
                }
            }
        }

        paths.sort();
        Ok(paths)
    }
}
