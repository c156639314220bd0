//! History command implementation

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::run::follow_run;
use super::{print_folder_heading, single_folder};
use crate::cli::args::HistoryCommands;
use crate::history::{HistoryRecord, HistoryStatus};
use crate::ActContext;

pub async fn run_history_command(
    ctx: &ActContext,
    folders: &[PathBuf],
    command: HistoryCommands,
) -> Result<()> {
    match command {
        HistoryCommands::List => {
            for folder in folders {
                print_folder_heading(folder, folders);
                let records = ctx.history().list_history(folder).await?;
                if records.is_empty() {
                    println!("No runs recorded");
                }
                for record in &records {
                    println!("{}", format_record(record));
                }
            }
        }
        HistoryCommands::Restart { index } => {
            let folder = single_folder(folders)?;
            let started = ctx.restart(folder, index).await?;
            follow_run(ctx, folder, started).await?;
        }
        HistoryCommands::Stop { index } => {
            let folder = single_folder(folders)?;
            if ctx.history().stop(folder, index).await? {
                println!("✓ Stop requested for run #{index}");
            } else {
                println!("Run #{index} is not running");
            }
        }
        HistoryCommands::Remove { index } => {
            let folder = single_folder(folders)?;
            let removed = ctx.history().remove(folder, index).await?;
            println!("✓ Removed run #{} {}", removed.index, removed.name);
        }
        HistoryCommands::Logs { index } => {
            let folder = single_folder(folders)?;
            let record = ctx.history().record(folder, index).await?;
            let log = tokio::fs::read_to_string(&record.log_path)
                .await
                .with_context(|| format!("Failed to read {}", record.log_path.display()))?;
            print!("{log}");
        }
        HistoryCommands::Clear => {
            let folder = single_folder(folders)?;
            let count = ctx.history().clear_all(folder).await?;
            println!("✓ Cleared {count} run(s)");
        }
    }
    Ok(())
}

fn status_icon(status: HistoryStatus) -> &'static str {
    match status {
        HistoryStatus::Running => "⏳",
        HistoryStatus::Success => "✓",
        HistoryStatus::Failed => "✗",
        HistoryStatus::Cancelled => "⊘",
    }
}

fn format_record(record: &HistoryRecord) -> String {
    let duration = record
        .duration()
        .map(|d| format!(" in {}s", d.num_seconds()))
        .unwrap_or_default();
    format!(
        "#{:<4} {} {:<9} {}{}  {}",
        record.index,
        status_icon(record.status),
        record.status,
        record.started_at.format("%Y-%m-%d %H:%M:%S"),
        duration,
        record.name
    )
}
