use async_trait::async_trait;
use futures::stream::Stream;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use super::error::ProcessError;

/// Time a terminated process group gets before it is killed outright
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
    /// Stopped through its `CancelHandle`
    Cancelled,
}

/// Requests termination of a spawned process
///
/// Clones share state. Cancelling is idempotent and may happen before the
/// status future is first polled.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    requested: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.inner.requested.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_one();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.inner.notify.notified().await;
    }
}

pub type ProcessStreamItem = Result<String, ProcessError>;
pub type ProcessStreamFut = Pin<Box<dyn Stream<Item = ProcessStreamItem> + Send>>;
pub type ProcessStatusFut =
    Pin<Box<dyn futures::Future<Output = Result<ExitStatus, ProcessError>> + Send>>;

/// A running process: line streams, its completion and a way to stop it
pub struct ProcessStream {
    pub stdout: ProcessStreamFut,
    pub stderr: ProcessStreamFut,
    pub status: ProcessStatusFut,
    pub cancel: CancelHandle,
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Start a process and return as soon as it is running
    async fn spawn(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError>;
}

pub struct TokioProcessRunner;

impl TokioProcessRunner {
    /// Normalize a line by removing trailing newlines
    fn normalize_line(mut line: String) -> String {
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        line
    }

    fn create_line_stream<R>(reader: tokio::io::BufReader<R>) -> ProcessStreamFut
    where
        R: tokio::io::AsyncRead + Send + Unpin + 'static,
    {
        use tokio::io::AsyncBufReadExt;

        Box::pin(futures::stream::unfold(reader, |mut reader| async move {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) => None,
                Ok(_) => Some((Ok(Self::normalize_line(line)), reader)),
                Err(e) => Some((Err(ProcessError::Io(e)), reader)),
            }
        })) as ProcessStreamFut
    }

    fn parse_exit_status(status: std::process::ExitStatus) -> ExitStatus {
        if status.success() {
            ExitStatus::Success
        } else if let Some(code) = status.code() {
            ExitStatus::Error(code)
        } else {
            Self::parse_signal_status(status)
        }
    }

    #[cfg(unix)]
    fn parse_signal_status(status: std::process::ExitStatus) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            ExitStatus::Signal(signal)
        } else {
            ExitStatus::Error(1)
        }
    }

    #[cfg(not(unix))]
    fn parse_signal_status(_status: std::process::ExitStatus) -> ExitStatus {
        ExitStatus::Error(1)
    }

    fn log_command_start(command: &ProcessCommand) {
        tracing::debug!(
            "Executing subprocess: {} ({} argument(s))",
            command.program,
            command.args.len()
        );

        if let Some(ref dir) = command.working_dir {
            tracing::trace!("Working directory: {:?}", dir);
        }
    }

    fn configure_command(command: &ProcessCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&command.program);

        // Own process group so a stop reaches the containers' helper processes too
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        cmd.args(&command.args);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd
    }

    fn map_spawn_error(error: std::io::Error, program: &str) -> ProcessError {
        if error.kind() == std::io::ErrorKind::NotFound {
            tracing::error!("Command '{}' not found on PATH", program);
            ProcessError::CommandNotFound(program.to_string())
        } else {
            tracing::error!("Failed to spawn '{}': {}", program, error);
            ProcessError::SpawnFailed {
                command: program.to_string(),
                source: error,
            }
        }
    }

    fn extract_stream<T>(stream: Option<T>, stream_name: &str) -> Result<T, ProcessError> {
        stream.ok_or_else(|| ProcessError::Internal {
            message: format!("Failed to capture {}", stream_name),
        })
    }

    /// Ask the process group to exit, then kill the child if it lingers
    async fn terminate(
        child: &mut tokio::process::Child,
    ) -> Result<std::process::ExitStatus, ProcessError> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = child.id() {
                if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                    tracing::debug!("SIGTERM to process group {} failed: {}", pid, e);
                }
                if let Ok(status) = tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
                    return status.map_err(ProcessError::Io);
                }
                tracing::warn!("Process group {} ignored SIGTERM, killing", pid);
            }
        }

        child.kill().await.map_err(ProcessError::Io)?;
        child.wait().await.map_err(ProcessError::Io)
    }

    fn create_status_future(
        mut child: tokio::process::Child,
        timeout: Option<Duration>,
        cancel: CancelHandle,
        program: String,
    ) -> ProcessStatusFut {
        Box::pin(async move {
            let deadline = async {
                match timeout {
                    Some(limit) => tokio::time::sleep(limit).await,
                    None => futures::future::pending::<()>().await,
                }
            };

            tokio::select! {
                status = child.wait() => {
                    let status = status.map_err(ProcessError::Io)?;
                    Ok(Self::parse_exit_status(status))
                }
                _ = cancel.cancelled() => {
                    tracing::debug!("Cancelling '{}'", program);
                    Self::terminate(&mut child).await?;
                    Ok(ExitStatus::Cancelled)
                }
                _ = deadline => {
                    Self::terminate(&mut child).await?;
                    Err(ProcessError::Timeout(timeout.unwrap_or_default()))
                }
            }
        })
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn spawn(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError> {
        use tokio::io::BufReader;

        Self::log_command_start(&command);

        let mut child = Self::configure_command(&command)
            .spawn()
            .map_err(|e| Self::map_spawn_error(e, &command.program))?;

        let stdout = Self::extract_stream(child.stdout.take(), "stdout")?;
        let stderr = Self::extract_stream(child.stderr.take(), "stderr")?;

        let cancel = CancelHandle::new();
        let status = Self::create_status_future(
            child,
            command.timeout,
            cancel.clone(),
            command.program.clone(),
        );

        Ok(ProcessStream {
            stdout: Self::create_line_stream(BufReader::new(stdout)),
            stderr: Self::create_line_stream(BufReader::new(stderr)),
            status,
            cancel,
        })
    }
}
