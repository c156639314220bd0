//! Workflow definitions discovered in a workspace folder
//!
//! - `index` - Scans the workflows directory and parses every file
//! - `extract` - Finds secret, variable, input and runner references

pub mod extract;
pub mod index;

pub use extract::{dedup_names, extract, ExtractedName, PatternKind};
pub use index::{WorkflowIndex, DEFAULT_WORKFLOWS_DIR};

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// One workflow file. Re-created on every scan, never mutated.
#[derive(Debug, Clone)]
pub struct Workflow {
    /// Declared `name:` or the file name
    pub name: String,
    pub path: PathBuf,
    pub content: WorkflowContent,
}

/// Either the parsed document with its text, or the reason parsing failed
#[derive(Debug, Clone)]
pub enum WorkflowContent {
    Parsed { text: String, document: Value },
    Failed { error: String },
}

/// A job declared under `jobs:`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub key: String,
    pub name: String,
}

impl Workflow {
    /// Build a workflow from raw text, recording a parse failure as data
    pub fn from_text(path: &Path, text: String) -> Self {
        let file_name = file_name(path);
        match parse_document(&text) {
            Ok(document) => {
                let name = document
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or(file_name);
                Self {
                    name,
                    path: path.to_path_buf(),
                    content: WorkflowContent::Parsed { text, document },
                }
            }
            Err(error) => Self::failed(path, error),
        }
    }

    pub fn failed(path: &Path, error: impl Into<String>) -> Self {
        Self {
            name: file_name(path),
            path: path.to_path_buf(),
            content: WorkflowContent::Failed {
                error: error.into(),
            },
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            WorkflowContent::Parsed { text, .. } => Some(text),
            WorkflowContent::Failed { .. } => None,
        }
    }

    pub fn document(&self) -> Option<&Value> {
        match &self.content {
            WorkflowContent::Parsed { document, .. } => Some(document),
            WorkflowContent::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.content {
            WorkflowContent::Failed { error } => Some(error),
            WorkflowContent::Parsed { .. } => None,
        }
    }

    /// Jobs in declaration order
    pub fn jobs(&self) -> Vec<Job> {
        let Some(jobs) = self
            .document()
            .and_then(|doc| doc.get("jobs"))
            .and_then(Value::as_mapping)
        else {
            return Vec::new();
        };

        jobs.iter()
            .filter_map(|(key, body)| {
                let key = key.as_str()?.to_string();
                let name = body
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| key.clone());
                Some(Job { key, name })
            })
            .collect()
    }

    pub fn job(&self, key: &str) -> Option<Job> {
        self.jobs().into_iter().find(|job| job.key == key)
    }

    /// Trigger event names from `on:`
    pub fn events(&self) -> Vec<String> {
        let Some(document) = self.document().and_then(Value::as_mapping) else {
            return Vec::new();
        };

        match trigger_value(document) {
            Some(Value::String(event)) => vec![event.clone()],
            Some(Value::Sequence(events)) => events
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::Mapping(events)) => events
                .keys()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn parse_document(text: &str) -> Result<Value, String> {
    let document: Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    if document.is_mapping() {
        Ok(document)
    } else {
        Err("workflow root must be a mapping".to_string())
    }
}

/// YAML 1.1 readers turn a bare `on` key into `true`; accept both
fn trigger_value(document: &Mapping) -> Option<&Value> {
    document
        .get(Value::String("on".to_string()))
        .or_else(|| document.get(Value::Bool(true)))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
