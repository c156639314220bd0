//! Run history: one record per runner invocation and its lifecycle
//!
//! Status moves only from `Running` to a terminal state. The transition table
//! lives in [`HistoryStatus::apply`]; [`HistoryManager`] owns persistence, the
//! live process handles and the startup sweep of orphaned runs.

pub mod host;
pub mod manager;

pub use host::RunHost;
pub use manager::{HistoryManager, StartedRun};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::command::CommandArgs;
use crate::subprocess::{ExitStatus, ProcessError};

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Invalid transition: {signal:?} received while {from}")]
    InvalidTransition {
        from: HistoryStatus,
        signal: RunSignal,
    },

    #[error("No history record with index {0}")]
    NotFound(u64),

    #[error("Run task failed: {0}")]
    TaskFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Running,
    Success,
    Failed,
    Cancelled,
}

impl HistoryStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, HistoryStatus::Running)
    }

    /// Next status after `signal`; terminal states accept nothing
    pub fn apply(self, signal: RunSignal) -> Result<HistoryStatus, HistoryError> {
        match (self, signal) {
            (HistoryStatus::Running, RunSignal::Succeeded) => Ok(HistoryStatus::Success),
            (HistoryStatus::Running, RunSignal::Failed) => Ok(HistoryStatus::Failed),
            (HistoryStatus::Running, RunSignal::Cancelled) => Ok(HistoryStatus::Cancelled),
            (from, signal) => Err(HistoryError::InvalidTransition { from, signal }),
        }
    }
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HistoryStatus::Running => "running",
            HistoryStatus::Success => "success",
            HistoryStatus::Failed => "failed",
            HistoryStatus::Cancelled => "cancelled",
        };
        f.pad(label)
    }
}

/// Completion signal reported by the execution host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSignal {
    Succeeded,
    Failed,
    Cancelled,
}

impl RunSignal {
    /// Interpret a process outcome. Once a stop was requested, any
    /// non-success exit counts as a cancellation.
    pub fn from_exit(outcome: &Result<ExitStatus, ProcessError>, stop_requested: bool) -> Self {
        match outcome {
            Ok(ExitStatus::Success) => RunSignal::Succeeded,
            Ok(ExitStatus::Cancelled) => RunSignal::Cancelled,
            _ if stop_requested => RunSignal::Cancelled,
            _ => RunSignal::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub index: u64,
    pub name: String,
    pub status: HistoryStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub log_path: PathBuf,
    pub command_args: CommandArgs,
    /// Redacted display command
    pub display_command: String,
    /// Process that spawned the run and holds its handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<RunHost>,
}

impl HistoryRecord {
    pub fn is_running(&self) -> bool {
        self.status == HistoryStatus::Running
    }

    /// Apply a signal and stamp the end time
    pub fn transition(&mut self, signal: RunSignal, at: DateTime<Utc>) -> Result<(), HistoryError> {
        self.status = self.status.apply(signal)?;
        self.ended_at = Some(at);
        Ok(())
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}

/// Persisted history of one workspace folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLedger {
    /// Lowest index never handed out
    #[serde(default)]
    pub next_index: u64,
    #[serde(default)]
    pub records: Vec<HistoryRecord>,
}

impl HistoryLedger {
    /// Reserve the index for a new record
    pub fn allocate_index(&mut self) -> u64 {
        let after_existing = self
            .records
            .iter()
            .map(|r| r.index + 1)
            .max()
            .unwrap_or(0);
        let index = self.next_index.max(after_existing);
        self.next_index = index + 1;
        index
    }

    pub fn get(&self, index: u64) -> Option<&HistoryRecord> {
        self.records.iter().find(|r| r.index == index)
    }

    pub fn get_mut(&mut self, index: u64) -> Option<&mut HistoryRecord> {
        self.records.iter_mut().find(|r| r.index == index)
    }

    pub fn remove(&mut self, index: u64) -> Option<HistoryRecord> {
        let position = self.records.iter().position(|r| r.index == index)?;
        Some(self.records.remove(position))
    }

    /// Force `Running` records that nobody is tracking to `Cancelled`.
    /// The end time stays unset; no completion was ever observed.
    pub fn sweep_running<F>(&mut self, is_tracked: F) -> Vec<u64>
    where
        F: Fn(&HistoryRecord) -> bool,
    {
        let mut swept = Vec::new();
        for record in self.records.iter_mut() {
            if record.is_running() && !is_tracked(record) {
                record.status = HistoryStatus::Cancelled;
                swept.push(record.index);
            }
        }
        swept
    }
}
