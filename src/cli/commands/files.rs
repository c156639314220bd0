//! Setting files command implementation

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use super::{checkbox, print_folder_heading, single_folder};
use crate::cli::args::FilesCommands;
use crate::settings::{Category, SettingFile};
use crate::ActContext;

pub async fn run_files_command(
    ctx: &ActContext,
    folders: &[PathBuf],
    command: FilesCommands,
) -> Result<()> {
    match command {
        FilesCommands::List { category } => {
            ensure_file_category(category)?;
            for folder in folders {
                print_folder_heading(folder, folders);
                let files = ctx.settings().list_setting_files(folder, category).await?;
                if files.is_empty() {
                    println!("No {category} files");
                }
                for file in files {
                    println!(
                        "{} {}  {}",
                        checkbox(file.selected),
                        file.name,
                        file.path.display()
                    );
                }
            }
        }
        FilesCommands::Add {
            category,
            name,
            path,
            select,
        } => {
            ensure_file_category(category)?;
            let folder = single_folder(folders)?;
            let path = absolute_file(folder, &path)?;
            let mut file = SettingFile::new(&name, &path);
            file.selected = select;
            ctx.settings()
                .add_setting_file(folder, category, file)
                .await?;
            println!("✓ Added {category} file '{name}' ({})", path.display());
        }
        FilesCommands::Select {
            category,
            name,
            off,
        } => {
            ensure_file_category(category)?;
            let folder = single_folder(folders)?;
            set_file_selection(ctx, folder, category, &name, !off).await?;
            println!(
                "✓ {} {category} file '{name}'",
                if off { "Deselected" } else { "Selected" }
            );
        }
        FilesCommands::Remove { category, name } => {
            ensure_file_category(category)?;
            let folder = single_folder(folders)?;
            if !ctx
                .settings()
                .remove_setting_file(folder, category, &name)
                .await?
            {
                bail!("No {category} file named '{name}'");
            }
            println!("✓ Removed {category} file '{name}'");
        }
    }
    Ok(())
}

/// Flip the selection of an existing file
pub async fn set_file_selection(
    ctx: &ActContext,
    folder: &Path,
    category: Category,
    name: &str,
    selected: bool,
) -> Result<()> {
    let Some(mut file) = ctx
        .settings()
        .list_setting_files(folder, category)
        .await?
        .into_iter()
        .find(|f| f.name == name)
    else {
        bail!("No {category} file named '{name}'");
    };

    file.selected = selected;
    ctx.settings()
        .edit_setting_file(folder, category, file)
        .await?;
    Ok(())
}

/// Files are stored with absolute paths; relative ones resolve against the
/// workspace folder
fn absolute_file(folder: &Path, path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        folder.join(path)
    };
    let resolved = joined
        .canonicalize()
        .with_context(|| format!("Cannot read {}", joined.display()))?;
    if !resolved.is_file() {
        bail!("{} is not a file", resolved.display());
    }
    Ok(resolved)
}

fn ensure_file_category(category: Category) -> Result<()> {
    if category.descriptor().file_flag.is_none() {
        bail!("{category} do not accept files");
    }
    Ok(())
}
