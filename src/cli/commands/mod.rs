//! Command implementation modules
//!
//! Each command is implemented as a separate module.

pub mod files;
pub mod history;
pub mod options;
pub mod run;
pub mod settings;
pub mod workflows;

pub use files::run_files_command;
pub use history::run_history_command;
pub use options::run_options_command;
pub use run::run_run_command;
pub use settings::run_settings_command;
pub use workflows::run_workflows_command;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// The folder an editing command applies to
pub(crate) fn single_folder(folders: &[PathBuf]) -> Result<&Path> {
    match folders {
        [folder] => Ok(folder),
        [] => bail!("No workspace folder given"),
        _ => bail!("This command applies to one workspace folder; pass a single --folder"),
    }
}

/// Heading printed before a folder's entries when several folders are listed
pub(crate) fn print_folder_heading(folder: &Path, folders: &[PathBuf]) {
    if folders.len() > 1 {
        println!("📁 {}", folder.display());
    }
}

pub(crate) fn checkbox(selected: bool) -> &'static str {
    if selected {
        "[x]"
    } else {
        "[ ]"
    }
}
