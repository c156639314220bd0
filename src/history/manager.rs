//! Store-backed history operations and live run tracking

use chrono::Utc;
use futures::StreamExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{HistoryError, HistoryLedger, HistoryRecord, HistoryStatus, RunHost, RunSignal};
use crate::command::{CommandArgs, SynthesizedCommand};
use crate::storage::{folder_digest, Namespace, Partition, PartitionLocks, StoreSet};
use crate::subprocess::{CancelHandle, ProcessRunner, ProcessStream};
use crate::Result;

type RunKey = (PathBuf, u64);

/// Tracks runs per workspace folder
#[derive(Clone)]
pub struct HistoryManager {
    inner: Arc<Inner>,
}

struct Inner {
    stores: StoreSet,
    locks: PartitionLocks,
    runner: Arc<dyn ProcessRunner>,
    logs_dir: PathBuf,
    /// Identity stamped on records this process starts
    host: Option<RunHost>,
    live: Mutex<HashMap<RunKey, CancelHandle>>,
}

/// A run that has been spawned and recorded
pub struct StartedRun {
    pub record: HistoryRecord,
    /// Output lines as they are produced; closes when the process exits
    pub output: mpsc::UnboundedReceiver<String>,
    completion: JoinHandle<Result<Option<HistoryStatus>>>,
}

impl StartedRun {
    /// Wait for the terminal status. `None` when the record was removed
    /// before the process finished.
    pub async fn wait(self) -> Result<Option<HistoryStatus>> {
        self.completion
            .await
            .map_err(|e| HistoryError::TaskFailed(e.to_string()))?
    }
}

impl HistoryManager {
    pub fn new(stores: StoreSet, runner: Arc<dyn ProcessRunner>, logs_dir: PathBuf) -> Self {
        let host = RunHost::current();
        if host.is_none() {
            warn!("Cannot identify this process; its runs cannot be stopped from elsewhere");
        }
        Self {
            inner: Arc::new(Inner {
                stores,
                locks: PartitionLocks::new(),
                runner,
                logs_dir,
                host,
                live: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn partition(folder: &Path) -> Partition {
        Partition::new(Namespace::History, folder, None)
    }

    fn log_path(&self, folder: &Path, index: u64) -> PathBuf {
        self.inner
            .logs_dir
            .join(folder_digest(folder))
            .join(format!("{index}.log"))
    }

    async fn read_ledger(&self, partition: &Partition) -> Result<HistoryLedger> {
        Ok(self
            .inner
            .stores
            .load(partition, false)
            .await?
            .unwrap_or_default())
    }

    async fn write_ledger(&self, partition: &Partition, ledger: &HistoryLedger) -> Result<()> {
        self.inner.stores.save(partition, ledger, false).await?;
        Ok(())
    }

    /// Load the folder's history. A `Running` record survives only while this
    /// manager tracks its process or its recorded host (PID and start time)
    /// is still alive; any other is an orphan and is persisted as `Cancelled`.
    pub async fn load(&self, folder: &Path) -> Result<HistoryLedger> {
        let partition = Self::partition(folder);
        let _guard = self.inner.locks.lock(&partition).await;
        self.load_locked(folder, &partition).await
    }

    async fn load_locked(&self, folder: &Path, partition: &Partition) -> Result<HistoryLedger> {
        let mut ledger = self.read_ledger(partition).await?;

        let live: Vec<u64> = {
            let handles = self.inner.live.lock().await;
            handles
                .keys()
                .filter(|(f, _)| f == folder)
                .map(|(_, index)| *index)
                .collect()
        };
        let swept = ledger.sweep_running(|record| {
            live.contains(&record.index)
                || record.host.is_some_and(|host| host.is_alive_elsewhere())
        });

        if !swept.is_empty() {
            warn!(
                "Marked {} orphaned run(s) in {} as cancelled: {:?}",
                swept.len(),
                folder.display(),
                swept
            );
            self.write_ledger(partition, &ledger).await?;
        }
        Ok(ledger)
    }

    pub async fn list_history(&self, folder: &Path) -> Result<Vec<HistoryRecord>> {
        Ok(self.load(folder).await?.records)
    }

    pub async fn record(&self, folder: &Path, index: u64) -> Result<HistoryRecord> {
        self.load(folder)
            .await?
            .get(index)
            .cloned()
            .ok_or_else(|| HistoryError::NotFound(index).into())
    }

    /// Stored arguments of a record, for replaying it
    pub async fn command_args(&self, folder: &Path, index: u64) -> Result<CommandArgs> {
        Ok(self.record(folder, index).await?.command_args)
    }

    /// Spawn `command` and record it as `Running`. Nothing is recorded when
    /// the process cannot be started.
    pub async fn start_run(
        &self,
        args: CommandArgs,
        command: &SynthesizedCommand,
    ) -> Result<StartedRun> {
        let folder = args.folder.clone();
        let display_command = command.redacted_display();

        let process = self
            .inner
            .runner
            .spawn(command.to_process_command(&folder))
            .await?;

        let partition = Self::partition(&folder);
        let guard = self.inner.locks.lock(&partition).await;

        let mut ledger = match self.load_locked(&folder, &partition).await {
            Ok(ledger) => ledger,
            Err(e) => {
                abandon(process);
                return Err(e);
            }
        };
        let index = ledger.allocate_index();
        let record = HistoryRecord {
            index,
            name: args.name.clone(),
            status: HistoryStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            log_path: self.log_path(&folder, index),
            command_args: args,
            display_command,
            host: self.inner.host,
        };
        ledger.records.push(record.clone());

        if let Err(e) = self.write_ledger(&partition, &ledger).await {
            abandon(process);
            return Err(e);
        }
        self.inner
            .live
            .lock()
            .await
            .insert((folder.clone(), index), process.cancel.clone());
        drop(guard);

        info!(
            "Started run {} '{}' in {}: {}",
            index,
            record.name,
            folder.display(),
            record.display_command
        );

        let (tx, output) = mpsc::unbounded_channel();
        let manager = self.clone();
        let log_path = record.log_path.clone();
        let completion = tokio::spawn(async move {
            manager
                .drive(folder, index, process, log_path, tx)
                .await
        });

        Ok(StartedRun {
            record,
            output,
            completion,
        })
    }

    /// Drain output into the log while waiting for the exit, then apply the
    /// terminal transition.
    async fn drive(
        self,
        folder: PathBuf,
        index: u64,
        process: ProcessStream,
        log_path: PathBuf,
        tx: mpsc::UnboundedSender<String>,
    ) -> Result<Option<HistoryStatus>> {
        let ProcessStream {
            stdout,
            stderr,
            status,
            cancel,
        } = process;

        let drain = async move {
            let mut log = match open_log(&log_path).await {
                Ok(file) => Some(file),
                Err(e) => {
                    warn!("Cannot write run log {}: {}", log_path.display(), e);
                    None
                }
            };

            let mut lines = futures::stream::select(stdout, stderr);
            while let Some(line) = lines.next().await {
                match line {
                    Ok(line) => {
                        if let Some(file) = log.as_mut() {
                            if let Err(e) = file.write_all(format!("{line}\n").as_bytes()).await {
                                warn!("Run log write failed, closing it: {}", e);
                                log = None;
                            }
                        }
                        let _ = tx.send(line);
                    }
                    Err(e) => debug!("Output stream error: {}", e),
                }
            }

            if let Some(mut file) = log {
                let _ = file.flush().await;
            }
        };

        let (_, outcome) = tokio::join!(drain, status);
        if let Err(e) = &outcome {
            warn!("Run {} ended with a host error: {}", index, e);
        }
        let signal = RunSignal::from_exit(&outcome, cancel.is_cancelled());
        self.finish(&folder, index, signal).await
    }

    /// Apply a completion signal to a record. Signals for removed records are
    /// dropped.
    pub async fn finish(
        &self,
        folder: &Path,
        index: u64,
        signal: RunSignal,
    ) -> Result<Option<HistoryStatus>> {
        let partition = Self::partition(folder);
        let _guard = self.inner.locks.lock(&partition).await;
        self.inner
            .live
            .lock()
            .await
            .remove(&(folder.to_path_buf(), index));

        let mut ledger = self.read_ledger(&partition).await?;
        let Some(record) = ledger.get_mut(index) else {
            debug!("Run {} finished after its record was removed", index);
            return Ok(None);
        };

        if record.status.is_terminal() {
            warn!(
                "Ignoring {:?} for run {}: already {}",
                signal, index, record.status
            );
            return Ok(Some(record.status));
        }

        record.transition(signal, Utc::now())?;
        let status = record.status;
        self.write_ledger(&partition, &ledger).await?;

        info!("Run {} in {} finished: {}", index, folder.display(), status);
        Ok(Some(status))
    }

    /// Ask a live run to terminate. The status changes once the process
    /// reports its exit. Runs hosted by another process are interrupted
    /// through that process. Returns whether anything was signalled.
    pub async fn stop(&self, folder: &Path, index: u64) -> Result<bool> {
        let handle = self
            .inner
            .live
            .lock()
            .await
            .get(&(folder.to_path_buf(), index))
            .cloned();

        if let Some(cancel) = handle {
            info!("Stopping run {} in {}", index, folder.display());
            cancel.cancel();
            return Ok(true);
        }

        let record = self.record(folder, index).await?;
        match record.host {
            Some(host) if record.is_running() && host.is_alive_elsewhere() => {
                info!("Interrupting process {} hosting run {}", host.pid, index);
                host.interrupt()?;
                Ok(true)
            }
            _ => {
                debug!("Run {} has no live process", index);
                Ok(false)
            }
        }
    }

    /// Delete a record and its log. A running record is stopped first,
    /// wherever it is hosted.
    pub async fn remove(&self, folder: &Path, index: u64) -> Result<HistoryRecord> {
        if self.record(folder, index).await?.is_running() {
            self.stop(folder, index).await?;
        }

        let partition = Self::partition(folder);
        let _guard = self.inner.locks.lock(&partition).await;
        let mut ledger = self.read_ledger(&partition).await?;
        let removed = ledger.remove(index).ok_or(HistoryError::NotFound(index))?;
        self.write_ledger(&partition, &ledger).await?;

        remove_log(&removed.log_path).await;
        debug!("Removed run {} from {}", index, folder.display());
        Ok(removed)
    }

    /// Empty the folder's history, stopping live runs. Indices keep counting
    /// from where they were.
    pub async fn clear_all(&self, folder: &Path) -> Result<usize> {
        let running: Vec<u64> = self
            .load(folder)
            .await?
            .records
            .iter()
            .filter(|record| record.is_running())
            .map(|record| record.index)
            .collect();
        for index in running {
            self.stop(folder, index).await?;
        }

        let partition = Self::partition(folder);
        let _guard = self.inner.locks.lock(&partition).await;
        let mut ledger = self.read_ledger(&partition).await?;
        let removed = std::mem::take(&mut ledger.records);
        self.write_ledger(&partition, &ledger).await?;

        for record in &removed {
            remove_log(&record.log_path).await;
        }
        info!("Cleared {} run(s) from {}", removed.len(), folder.display());
        Ok(removed.len())
    }
}

/// Stop a process that could not be recorded and reap it in the background
fn abandon(process: ProcessStream) {
    process.cancel.cancel();
    tokio::spawn(async move {
        let _ = process.status.await;
    });
}

async fn open_log(path: &Path) -> std::io::Result<tokio::fs::File> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
}

async fn remove_log(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove run log {}: {}", path.display(), e),
    }
}
