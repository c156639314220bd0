//! Explicitly constructed engine context
//!
//! Components are built in dependency order: stores, settings, history, then
//! the command synthesizer. Callers receive the context instead of reaching
//! for process-wide state.

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::command::{CommandArgs, CommandSynthesizer, RunTarget, SynthesizedCommand};
use crate::config::ActbenchConfig;
use crate::history::{HistoryManager, StartedRun};
use crate::settings::SettingsManager;
use crate::storage::StoreSet;
use crate::subprocess::ProcessRunner;
use crate::workflow::WorkflowIndex;
use crate::{Error, Result};

#[derive(Clone)]
pub struct ActContext {
    config: ActbenchConfig,
    stores: StoreSet,
    settings: SettingsManager,
    history: HistoryManager,
    synthesizer: CommandSynthesizer,
}

impl ActContext {
    /// File-backed context under the configured state directory
    pub async fn new(config: ActbenchConfig, runner: Arc<dyn ProcessRunner>) -> Result<Self> {
        let stores = StoreSet::open(&config.state_dir).await?;
        Self::with_stores(config, stores, runner)
    }

    /// Context whose settings and history live in memory; run logs still go
    /// to the configured logs directory
    pub fn in_memory(config: ActbenchConfig, runner: Arc<dyn ProcessRunner>) -> Result<Self> {
        Self::with_stores(config, StoreSet::in_memory(), runner)
    }

    pub fn with_stores(
        config: ActbenchConfig,
        stores: StoreSet,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Self> {
        let settings = SettingsManager::new(
            stores.clone(),
            WorkflowIndex::new(config.workflows_dir.clone()),
        );
        let history = HistoryManager::new(stores.clone(), runner, config.logs_dir());
        let synthesizer =
            CommandSynthesizer::new(&config.act_command)?.with_timeout(config.run_timeout());

        Ok(Self {
            config,
            stores,
            settings,
            history,
            synthesizer,
        })
    }

    pub fn config(&self) -> &ActbenchConfig {
        &self.config
    }

    pub fn stores(&self) -> &StoreSet {
        &self.stores
    }

    pub fn settings(&self) -> &SettingsManager {
        &self.settings
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn synthesizer(&self) -> &CommandSynthesizer {
        &self.synthesizer
    }

    pub fn workflows(&self) -> &WorkflowIndex {
        self.settings.index()
    }

    /// Check that the target names an existing workflow (and job)
    pub async fn validate_target(&self, folder: &Path, target: &RunTarget) -> Result<()> {
        match target {
            RunTarget::AllWorkflows | RunTarget::Event { .. } => Ok(()),
            RunTarget::Workflow { path } => {
                self.workflows().find(folder, path).await?;
                Ok(())
            }
            RunTarget::Job { workflow, job } => {
                let found = self.workflows().find(folder, workflow).await?;
                if let Some(error) = found.error() {
                    return Err(Error::Workflow(format!(
                        "{} cannot be parsed: {}",
                        found.path.display(),
                        error
                    )));
                }
                found
                    .job(job)
                    .map(|_| ())
                    .ok_or_else(|| Error::NotFound(format!("job '{}' in {}", job, found.name)))
            }
        }
    }

    /// Resolve a user-supplied target to absolute workflow paths
    pub async fn resolve_target(&self, folder: &Path, target: RunTarget) -> Result<RunTarget> {
        self.validate_target(folder, &target).await?;
        Ok(match target {
            RunTarget::Workflow { path } => RunTarget::Workflow {
                path: self.workflows().find(folder, &path).await?.path,
            },
            RunTarget::Job { workflow, job } => RunTarget::Job {
                workflow: self.workflows().find(folder, &workflow).await?.path,
                job,
            },
            other => other,
        })
    }

    /// Build the command for `args` from the folder's current settings
    pub async fn synthesize(&self, args: &CommandArgs) -> Result<SynthesizedCommand> {
        let resolved = self.settings.resolve(&args.folder).await?;
        let command = self.synthesizer.build_for(args, &resolved);
        debug!("Synthesized: {}", command.redacted_display());
        Ok(command)
    }

    /// Synthesize, spawn and record a run
    pub async fn run(&self, args: CommandArgs) -> Result<StartedRun> {
        let command = self.synthesize(&args).await?;
        self.history.start_run(args, &command).await
    }

    /// Replay a record's arguments as a new run with current settings
    pub async fn restart(&self, folder: &Path, index: u64) -> Result<StartedRun> {
        let args = self.history.command_args(folder, index).await?;
        self.run(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryStatus;
    use crate::settings::{Category, Setting};
    use crate::subprocess::MockProcessRunner;
    use crate::workflow::DEFAULT_WORKFLOWS_DIR;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn context(root: &Path, runner: MockProcessRunner) -> ActContext {
        let config = ActbenchConfig {
            state_dir: root.join("state"),
            ..ActbenchConfig::default()
        };
        ActContext::in_memory(config, Arc::new(runner)).unwrap()
    }

    fn workspace() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(DEFAULT_WORKFLOWS_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("build.yml"),
            "name: Build\non: push\njobs:\n  test:\n    runs-on: ubuntu-latest\n    steps:\n      - run: echo ${{ secrets.API_KEY }}\n",
        )
        .unwrap();
        temp_dir
    }

    #[tokio::test]
    async fn test_rejects_empty_act_command() {
        let config = ActbenchConfig {
            act_command: String::new(),
            ..ActbenchConfig::default()
        };
        let result = ActContext::in_memory(config, Arc::new(MockProcessRunner::new()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_resolve_target_by_file_name() {
        let temp_dir = workspace();
        let ctx = context(temp_dir.path(), MockProcessRunner::new());

        let target = ctx
            .resolve_target(
                temp_dir.path(),
                RunTarget::Job {
                    workflow: PathBuf::from("build.yml"),
                    job: "test".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(
            target,
            RunTarget::Job {
                workflow: temp_dir.path().join(DEFAULT_WORKFLOWS_DIR).join("build.yml"),
                job: "test".into(),
            }
        );

        let missing_job = ctx
            .validate_target(
                temp_dir.path(),
                &RunTarget::Job {
                    workflow: PathBuf::from("build.yml"),
                    job: "deploy".into(),
                },
            )
            .await;
        assert!(matches!(missing_job, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_run_and_restart_use_current_settings() {
        let temp_dir = workspace();
        let folder = temp_dir.path();
        let mut runner = MockProcessRunner::new();
        runner.expect_command("act").returns_success().finish();
        let ctx = context(folder, runner.clone());

        let args = CommandArgs::new(folder, RunTarget::AllWorkflows);
        let first = ctx.run(args).await.unwrap();
        assert_eq!(first.wait().await.unwrap(), Some(HistoryStatus::Success));

        ctx.settings()
            .edit_setting(
                folder,
                Setting::new(Category::Secrets, "API_KEY")
                    .with_value("s3cret")
                    .selected(true),
                Category::Secrets,
            )
            .await
            .unwrap();

        let second = ctx.restart(folder, 0).await.unwrap();
        assert_eq!(second.record.index, 1);
        assert_eq!(second.wait().await.unwrap(), Some(HistoryStatus::Success));

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].args.is_empty());
        assert_eq!(calls[1].args, vec!["--secret", "API_KEY=s3cret"]);
        assert_eq!(calls[1].working_dir.as_deref(), Some(folder));
    }
}
