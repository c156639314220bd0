//! Run command implementation

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::single_folder;
use crate::cli::args::RunArgs;
use crate::command::{CommandArgs, RunTarget};
use crate::history::{HistoryStatus, StartedRun};
use crate::ActContext;

pub async fn run_run_command(ctx: &ActContext, folders: &[PathBuf], args: RunArgs) -> Result<()> {
    let folder = single_folder(folders)?;
    let target = ctx.resolve_target(folder, target_from(&args)).await?;

    let mut command_args = CommandArgs::new(folder, target);
    if let Some(name) = args.name {
        command_args = command_args.with_name(name);
    }

    if args.dry_run {
        let command = ctx.synthesize(&command_args).await?;
        println!("{}", command.redacted_display());
        return Ok(());
    }

    let started = ctx.run(command_args).await?;
    follow_run(ctx, folder, started).await
}

fn target_from(args: &RunArgs) -> RunTarget {
    match (&args.workflow, &args.job, &args.event) {
        (Some(workflow), Some(job), _) => RunTarget::Job {
            workflow: workflow.clone(),
            job: job.clone(),
        },
        (Some(path), None, _) => RunTarget::Workflow { path: path.clone() },
        (None, _, Some(event)) => RunTarget::Event {
            event: event.clone(),
        },
        (None, _, None) => RunTarget::AllWorkflows,
    }
}

/// Print a run's output until it exits. Ctrl-C stops the run; the record
/// then ends as cancelled.
pub(crate) async fn follow_run(
    ctx: &ActContext,
    folder: &Path,
    mut started: StartedRun,
) -> Result<()> {
    let index = started.record.index;
    println!("▶ Run #{} {}", index, started.record.name);
    println!("$ {}", started.record.display_command);

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut interrupted = false;

    loop {
        tokio::select! {
            line = started.output.recv() => match line {
                Some(line) => println!("{line}"),
                None => break,
            },
            result = &mut interrupt, if !interrupted => {
                result.context("Failed to listen for Ctrl-C")?;
                interrupted = true;
                eprintln!("Stopping run #{index}...");
                ctx.history().stop(folder, index).await?;
            }
        }
    }

    let status = started.wait().await?;
    debug!("Run {} ended with {:?}", index, status);
    match status {
        Some(HistoryStatus::Success) => {
            println!("✓ Run #{index} succeeded");
            Ok(())
        }
        Some(status) => bail!("Run #{index} {status}"),
        None => bail!("Run #{index} was removed before it finished"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(workflow: Option<&str>, job: Option<&str>, event: Option<&str>) -> RunArgs {
        RunArgs {
            workflow: workflow.map(PathBuf::from),
            job: job.map(str::to_string),
            event: event.map(str::to_string),
            name: None,
            dry_run: false,
        }
    }

    #[test]
    fn test_target_selection() {
        assert_eq!(target_from(&args(None, None, None)), RunTarget::AllWorkflows);
        assert_eq!(
            target_from(&args(None, None, Some("push"))),
            RunTarget::Event {
                event: "push".into()
            }
        );
        assert_eq!(
            target_from(&args(Some("ci.yml"), None, None)),
            RunTarget::Workflow {
                path: PathBuf::from("ci.yml")
            }
        );
        assert_eq!(
            target_from(&args(Some("ci.yml"), Some("test"), None)),
            RunTarget::Job {
                workflow: PathBuf::from("ci.yml"),
                job: "test".into()
            }
        );
    }
}
