//! Common test utilities and helpers

#![allow(dead_code)]

use actbench::config::ActbenchConfig;
use actbench::storage::{FileStore, Partition, StoreSet};
use actbench::subprocess::ProcessRunner;
use actbench::workflow::DEFAULT_WORKFLOWS_DIR;
use actbench::ActContext;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Builder for a temporary workspace folder with workflow files
pub struct TestWorkspaceBuilder {
    temp_dir: TempDir,
    workflows: Vec<(String, String)>,
}

impl TestWorkspaceBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            workflows: Vec::new(),
        })
    }

    /// Add a file under `.github/workflows`
    pub fn with_workflow(mut self, name: &str, content: &str) -> Self {
        self.workflows.push((name.to_string(), content.to_string()));
        self
    }

    pub fn build(self) -> Result<TestWorkspace> {
        let folder = self.temp_dir.path().join("repo");
        let workflows_dir = folder.join(DEFAULT_WORKFLOWS_DIR);
        fs::create_dir_all(&workflows_dir)?;
        for (name, content) in &self.workflows {
            fs::write(workflows_dir.join(name), content)?;
        }

        let state_dir = self.temp_dir.path().join("state");
        fs::create_dir_all(&state_dir)?;

        Ok(TestWorkspace {
            folder: folder.canonicalize()?,
            state_dir,
            _temp_dir: self.temp_dir,
        })
    }
}

/// A workspace folder plus a private state directory
pub struct TestWorkspace {
    pub folder: PathBuf,
    pub state_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn config(&self) -> ActbenchConfig {
        ActbenchConfig {
            state_dir: self.state_dir.clone(),
            ..ActbenchConfig::default()
        }
    }

    /// A context over file-backed stores; two contexts built this way share
    /// state like two sessions of the tool
    pub async fn context<R: ProcessRunner + 'static>(&self, runner: R) -> ActContext {
        ActContext::new(self.config(), Arc::new(runner))
            .await
            .expect("Failed to open context")
    }

    pub async fn stores(&self) -> StoreSet {
        StoreSet::open(&self.state_dir)
            .await
            .expect("Failed to open stores")
    }

    /// Raw bytes of a persisted partition, `None` if it was never written
    pub async fn partition_bytes(&self, partition: &Partition, protected: bool) -> Option<Vec<u8>> {
        let store = if protected {
            FileStore::protected(self.state_dir.join("secrets")).await
        } else {
            FileStore::new(self.state_dir.join("state")).await
        }
        .expect("Failed to open file store");
        fs::read(store.path_for(partition)).ok()
    }

    pub fn write_workflow(&self, name: &str, content: &str) {
        fs::write(self.folder.join(DEFAULT_WORKFLOWS_DIR).join(name), content)
            .expect("Failed to write workflow");
    }

    pub fn remove_workflow(&self, name: &str) {
        fs::remove_file(self.folder.join(DEFAULT_WORKFLOWS_DIR).join(name))
            .expect("Failed to remove workflow");
    }
}

pub const BUILD_WORKFLOW: &str = r#"name: Build
on:
  push:
  workflow_dispatch:
    inputs:
      target:
        description: Deploy target
jobs:
  test:
    runs-on: ubuntu-latest
    steps:
      - run: echo "${{ secrets.API_KEY }}"
      - if: ${{ vars.REGION == 'us-east-1' }}
        run: echo "east"
"#;
