use std::path::Path;
use std::time::Duration;

use super::quote;
use super::{CommandArgs, RunTarget};
use crate::settings::{Category, CustomOption, ResolvedSettings};
use crate::subprocess::{ProcessCommand, ProcessCommandBuilder};
use crate::{Error, Result};

/// Placeholder for password-like values in redacted output
pub const REDACTED: &str = "***";

const WORKFLOWS_FLAG: &str = "--workflows";
const JOB_FLAG: &str = "--job";

/// The runner invocation for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedCommand {
    /// Executable followed by its arguments; pass as a discrete list
    pub argv: Vec<String>,
    /// Shell-ready rendering of `argv` for humans, never for execution
    pub display_command: String,
    redacted: Vec<String>,
    timeout: Option<Duration>,
}

impl SynthesizedCommand {
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    /// Display form with password-like values masked, safe for logs and history
    pub fn redacted_display(&self) -> String {
        quote::join(&self.redacted)
    }

    /// Process description running in the workspace folder
    pub fn to_process_command(&self, folder: &Path) -> ProcessCommand {
        ProcessCommandBuilder::new(self.program())
            .args(self.args())
            .current_dir(folder)
            .timeout(self.timeout)
            .build()
    }
}

/// Builds runner invocations from settings, options and a target
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    base: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandSynthesizer {
    /// `act_command` is the runner invocation, e.g. `act` or `gh act`
    pub fn new(act_command: &str) -> Result<Self> {
        let base = shell_words::split(act_command)
            .map_err(|e| Error::Config(format!("Invalid act command '{act_command}': {e}")))?;
        if base.is_empty() {
            return Err(Error::Config("act command must not be empty".to_string()));
        }
        Ok(Self {
            base,
            timeout: None,
        })
    }

    /// Limit how long synthesized runs may take
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base(&self) -> &[String] {
        &self.base
    }

    /// Build the invocation for stored command arguments, using the
    /// options carried by `settings`
    pub fn build_for(&self, args: &CommandArgs, settings: &ResolvedSettings) -> SynthesizedCommand {
        self.build(&args.folder, settings, &settings.options, &args.target)
    }

    /// Assemble, in order: base invocation, target selector, selected
    /// options, then selected settings and files per category.
    pub fn build(
        &self,
        folder: &Path,
        settings: &ResolvedSettings,
        options: &[CustomOption],
        target: &RunTarget,
    ) -> SynthesizedCommand {
        let mut line = CommandLine::default();

        for token in &self.base {
            line.push(token.clone());
        }

        match target {
            RunTarget::AllWorkflows => {}
            RunTarget::Event { event } => line.push(event.clone()),
            RunTarget::Workflow { path } => {
                line.push(WORKFLOWS_FLAG.to_string());
                line.push(relative_to(folder, path));
            }
            RunTarget::Job { workflow, job } => {
                line.push(WORKFLOWS_FLAG.to_string());
                line.push(relative_to(folder, workflow));
                line.push(JOB_FLAG.to_string());
                line.push(job.clone());
            }
        }

        for option in options.iter().filter(|o| o.selected) {
            for token in option.to_args() {
                line.push(token);
            }
        }

        for category in Category::INJECTION_ORDER {
            let Some(entries) = settings.get(category) else {
                continue;
            };
            let descriptor = category.descriptor();

            if let Some(flag) = descriptor.value_flag {
                for setting in entries.settings.iter().filter(|s| s.selected) {
                    line.push(flag.to_string());
                    let assignment = format!("{}={}", setting.name, setting.value);
                    if setting.password {
                        line.push_masked(assignment, format!("{}={}", setting.name, REDACTED));
                    } else {
                        line.push(assignment);
                    }
                }
            }

            if let Some(flag) = descriptor.file_flag {
                for file in entries.files.iter().filter(|f| f.selected) {
                    line.push(flag.to_string());
                    line.push(file.path.display().to_string());
                }
            }
        }

        let display_command = quote::join(&line.argv);
        tracing::trace!("Synthesized {} argument(s)", line.argv.len());
        SynthesizedCommand {
            argv: line.argv,
            display_command,
            redacted: line.redacted,
            timeout: self.timeout,
        }
    }
}

#[derive(Default)]
struct CommandLine {
    argv: Vec<String>,
    redacted: Vec<String>,
}

impl CommandLine {
    fn push(&mut self, token: String) {
        self.redacted.push(token.clone());
        self.argv.push(token);
    }

    fn push_masked(&mut self, token: String, masked: String) {
        self.argv.push(token);
        self.redacted.push(masked);
    }
}

fn relative_to(folder: &Path, path: &Path) -> String {
    path.strip_prefix(folder)
        .unwrap_or(path)
        .display()
        .to_string()
}
