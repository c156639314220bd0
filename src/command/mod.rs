//! Runner command synthesis
//!
//! Turns reconciled settings, selected options and a run target into the
//! exact argument vector for the workflow runner, plus a shell-ready string
//! for display.

pub mod quote;
pub mod synthesizer;

pub use synthesizer::{CommandSynthesizer, SynthesizedCommand, REDACTED};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which workflows a run covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunTarget {
    /// Every workflow, default event
    AllWorkflows,
    /// Every workflow triggered by an event
    Event { event: String },
    /// One workflow file
    Workflow { path: PathBuf },
    /// One job of one workflow file
    Job { workflow: PathBuf, job: String },
}

impl RunTarget {
    /// Default display name for history records
    pub fn describe(&self) -> String {
        match self {
            RunTarget::AllWorkflows => "All workflows".to_string(),
            RunTarget::Event { event } => format!("Event: {event}"),
            RunTarget::Workflow { path } => file_label(path),
            RunTarget::Job { workflow, job } => format!("{}/{}", file_label(workflow), job),
        }
    }
}

/// Replayable description of a run, stored with its history record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandArgs {
    pub folder: PathBuf,
    pub target: RunTarget,
    pub name: String,
}

impl CommandArgs {
    pub fn new(folder: impl Into<PathBuf>, target: RunTarget) -> Self {
        let name = target.describe();
        Self {
            folder: folder.into(),
            target,
            name,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
