//! Command routing and execution

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli::args::{Cli, Commands};
use crate::cli::commands::*;
use crate::config::ActbenchConfig;
use crate::subprocess::production_runner;
use crate::ActContext;

/// Execute a CLI command based on the parsed arguments
pub async fn execute_command(cli: Cli, config: ActbenchConfig) -> Result<()> {
    let folders = resolve_folders(&cli.folders)?;
    let ctx = ActContext::new(config, production_runner())
        .await
        .context("Failed to open actbench state")?;

    match cli.command {
        Commands::Workflows => run_workflows_command(&ctx, &folders).await,
        Commands::Settings { command } => run_settings_command(&ctx, &folders, command).await,
        Commands::Files { command } => run_files_command(&ctx, &folders, command).await,
        Commands::Options { command } => run_options_command(&ctx, &folders, command).await,
        Commands::Run(args) => run_run_command(&ctx, &folders, args).await,
        Commands::History { command } => run_history_command(&ctx, &folders, command).await,
    }
}

/// Canonical workspace folders; the current directory when none are given.
/// Stored state is keyed by these paths.
fn resolve_folders(folders: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if folders.is_empty() {
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        return Ok(vec![cwd.canonicalize().unwrap_or(cwd)]);
    }

    folders
        .iter()
        .map(|folder| {
            folder
                .canonicalize()
                .with_context(|| format!("Workspace folder {} not found", folder.display()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_folders_defaults_to_current_dir() {
        let folders = resolve_folders(&[]).unwrap();
        assert_eq!(folders.len(), 1);
        assert!(folders[0].is_absolute());
    }

    #[test]
    fn test_resolve_folders_rejects_missing() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        assert!(resolve_folders(&[missing]).is_err());

        let found = resolve_folders(&[temp_dir.path().to_path_buf()]).unwrap();
        assert_eq!(found, vec![temp_dir.path().canonicalize().unwrap()]);
    }
}
