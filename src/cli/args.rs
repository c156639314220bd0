//! CLI argument structures

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::settings::Category;

/// Discover, configure, run and track local GitHub Actions workflow runs
#[derive(Parser, Debug)]
#[command(name = "actbench")]
#[command(about = "actbench - Run GitHub Actions workflows locally through act", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a config.toml replacing the default location
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Workspace folder (repeatable, defaults to the current directory)
    #[arg(short, long = "folder", global = true, value_name = "DIR")]
    pub folders: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List workflows with their jobs, triggers and parse errors
    Workflows,

    /// Inspect and edit secrets, variables, inputs and runners
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Manage env files and event payloads
    Files {
        #[command(subcommand)]
        command: FilesCommands,
    },

    /// Inspect and edit act command-line options
    Options {
        #[command(subcommand)]
        command: OptionsCommands,
    },

    /// Run workflows through act and record the run
    Run(RunArgs),

    /// Inspect and manage past runs
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
}

/// Mutually exclusive selection flags
#[derive(Args, Debug, Default, Clone, Copy)]
pub struct SelectionArgs {
    /// Inject this entry into runs
    #[arg(long, conflicts_with = "deselect")]
    pub select: bool,

    /// Stop injecting this entry
    #[arg(long)]
    pub deselect: bool,
}

impl SelectionArgs {
    /// Requested selection state, `None` to keep the current one
    pub fn requested(&self) -> Option<bool> {
        match (self.select, self.deselect) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// List settings of a category discovered in the workflows
    List {
        /// secrets, variables, inputs or runners
        category: Category,

        /// Print secret values instead of masking them
        #[arg(long)]
        reveal: bool,
    },

    /// Set the value or selection of a setting
    Set {
        category: Category,

        name: String,

        /// New value (runners take the container image)
        #[arg(long)]
        value: Option<String>,

        #[command(flatten)]
        selection: SelectionArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum FilesCommands {
    /// List files of a category
    List {
        /// secrets, variables, inputs or payload
        category: Category,
    },

    /// Add or replace a file
    Add {
        category: Category,

        /// Name to refer to the file by
        name: String,

        path: PathBuf,

        /// Select the file right away
        #[arg(long)]
        select: bool,
    },

    /// Select a file, deselecting the others where only one is allowed
    Select {
        category: Category,

        name: String,

        /// Deselect instead
        #[arg(long)]
        off: bool,
    },

    /// Remove a file from the list (the file itself is kept)
    Remove { category: Category, name: String },
}

#[derive(Subcommand, Debug)]
pub enum OptionsCommands {
    /// List act options with their values and selection
    List,

    /// Set the value or selection of an option
    Set {
        /// Flag name, with or without leading dashes (e.g. container-architecture)
        #[arg(allow_hyphen_values = true)]
        flag: String,

        #[arg(long, allow_hyphen_values = true)]
        value: Option<String>,

        #[command(flatten)]
        selection: SelectionArgs,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Workflow file (path relative to the folder, or file name)
    #[arg(short, long, conflicts_with = "event")]
    pub workflow: Option<PathBuf>,

    /// Job key inside the workflow
    #[arg(short, long, requires = "workflow")]
    pub job: Option<String>,

    /// Run every workflow triggered by this event
    #[arg(short, long)]
    pub event: Option<String>,

    /// Display name for the history record
    #[arg(long)]
    pub name: Option<String>,

    /// Print the command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// List runs
    List,

    /// Run a record's command again as a new run
    Restart { index: u64 },

    /// Stop a running run
    Stop { index: u64 },

    /// Remove a record and its log
    Remove { index: u64 },

    /// Print a run's log
    Logs { index: u64 },

    /// Remove every record
    Clear,
}
