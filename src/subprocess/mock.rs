use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::error::ProcessError;
use super::runner::{
    CancelHandle, ExitStatus, ProcessCommand, ProcessRunner, ProcessStatusFut, ProcessStream,
    ProcessStreamFut,
};

type ArgsPredicate = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

/// Scripted stand-in for a real process runner
///
/// Scripts are matched in registration order against the program name and an
/// optional argument predicate. A script answers any number of calls.
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    scripts: Arc<Mutex<Vec<Script>>>,
    calls: Arc<Mutex<Vec<ProcessCommand>>>,
}

/// What a scripted process prints and how it exits
#[derive(Clone)]
struct Output {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

/// How the mock answers a matching command
enum Reply {
    Output(Output),
    /// Output is released only once the gate is cancelled
    Held(Output, CancelHandle),
    LaunchFailure,
}

struct Script {
    program: String,
    args: Option<ArgsPredicate>,
    reply: Reply,
}

impl Script {
    fn matches(&self, command: &ProcessCommand) -> bool {
        self.program == command.program
            && self.args.as_ref().map_or(true, |pred| pred(&command.args))
    }
}

/// Builder returned by [`MockProcessRunner::expect_command`]; registered on `finish`
pub struct MockCommandConfig {
    runner: MockProcessRunner,
    program: String,
    args: Option<ArgsPredicate>,
    output: Output,
    gate: Option<CancelHandle>,
    launch_failure: bool,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_command(&mut self, program: &str) -> MockCommandConfig {
        MockCommandConfig {
            runner: self.clone(),
            program: program.to_string(),
            args: None,
            output: Output {
                status: ExitStatus::Success,
                stdout: String::new(),
                stderr: String::new(),
            },
            gate: None,
            launch_failure: false,
        }
    }

    /// Every command seen so far, in call order
    pub fn calls(&self) -> Vec<ProcessCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, program: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|cmd| cmd.program == program)
            .count()
    }

    fn answer(
        &self,
        command: &ProcessCommand,
    ) -> Result<(Output, Option<CancelHandle>), ProcessError> {
        self.calls.lock().unwrap().push(command.clone());

        let scripts = self.scripts.lock().unwrap();
        let script = scripts
            .iter()
            .find(|script| script.matches(command))
            .ok_or_else(|| {
                ProcessError::MockExpectationNotMet(format!(
                    "no script for {} {:?}",
                    command.program, command.args
                ))
            })?;

        match &script.reply {
            Reply::Output(output) => Ok((output.clone(), None)),
            Reply::Held(output, gate) => Ok((output.clone(), Some(gate.clone()))),
            Reply::LaunchFailure => Err(ProcessError::CommandNotFound(command.program.clone())),
        }
    }

    fn lines(text: &str) -> ProcessStreamFut {
        let lines: Vec<Result<String, ProcessError>> =
            text.lines().map(|line| Ok(line.to_string())).collect();
        Box::pin(futures::stream::iter(lines))
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn spawn(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError> {
        let (output, gate) = self.answer(&command)?;
        let cancel = CancelHandle::new();

        let status: ProcessStatusFut = {
            let cancel = cancel.clone();
            let exit = output.status.clone();
            Box::pin(async move {
                let released = async move {
                    if let Some(gate) = gate {
                        gate.cancelled().await;
                    }
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Ok(ExitStatus::Cancelled),
                    _ = released => Ok(exit),
                }
            })
        };

        Ok(ProcessStream {
            stdout: Self::lines(&output.stdout),
            stderr: Self::lines(&output.stderr),
            status,
            cancel,
        })
    }
}

impl MockCommandConfig {
    pub fn with_args<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.args = Some(Box::new(predicate));
        self
    }

    pub fn returns_stdout(mut self, stdout: &str) -> Self {
        self.output.stdout = stdout.to_string();
        self
    }

    pub fn returns_stderr(mut self, stderr: &str) -> Self {
        self.output.stderr = stderr.to_string();
        self
    }

    pub fn returns_exit_code(mut self, code: i32) -> Self {
        self.output.status = match code {
            0 => ExitStatus::Success,
            code => ExitStatus::Error(code),
        };
        self
    }

    pub fn returns_success(self) -> Self {
        self.returns_exit_code(0)
    }

    /// Spawned processes keep running until `gate` is cancelled
    /// (or the process itself is)
    pub fn holds_until(mut self, gate: CancelHandle) -> Self {
        self.gate = Some(gate);
        self
    }

    /// The program cannot be launched
    pub fn fails_to_spawn(mut self) -> Self {
        self.launch_failure = true;
        self
    }

    pub fn finish(self) {
        let reply = match (self.launch_failure, self.gate) {
            (true, _) => Reply::LaunchFailure,
            (false, Some(gate)) => Reply::Held(self.output, gate),
            (false, None) => Reply::Output(self.output),
        };
        self.runner.scripts.lock().unwrap().push(Script {
            program: self.program,
            args: self.args,
            reply,
        });
    }
}
