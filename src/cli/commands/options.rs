//! Runner options command implementation

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use super::{checkbox, print_folder_heading, single_folder};
use crate::cli::args::OptionsCommands;
use crate::settings::CustomOption;
use crate::ActContext;

pub async fn run_options_command(
    ctx: &ActContext,
    folders: &[PathBuf],
    command: OptionsCommands,
) -> Result<()> {
    match command {
        OptionsCommands::List => {
            for folder in folders {
                print_folder_heading(folder, folders);
                let options = ctx.settings().list_custom_options(folder).await?;
                let mut group = "";
                for option in &options {
                    if option.group != group {
                        group = &option.group;
                        println!("{group}:");
                    }
                    println!("  {}", format_option(option));
                }
            }
            Ok(())
        }
        OptionsCommands::Set {
            flag,
            value,
            selection,
        } => {
            let folder = single_folder(folders)?;
            let option = update_option(ctx, folder, &flag, value, selection.requested()).await?;
            println!("✓ {}", format_option(&option));
            Ok(())
        }
    }
}

/// Apply a value and selection change to a catalog option and persist it
pub async fn update_option(
    ctx: &ActContext,
    folder: &Path,
    flag: &str,
    value: Option<String>,
    selected: Option<bool>,
) -> Result<CustomOption> {
    let name = canonical_flag(flag);
    let Some(mut option) = ctx
        .settings()
        .list_custom_options(folder)
        .await?
        .into_iter()
        .find(|o| o.name == name)
    else {
        bail!("Unknown act option {name}; see `actbench options list`");
    };

    if let Some(value) = value {
        if !option.editable {
            bail!("{name} is a switch and takes no value");
        }
        option.value = value;
    }
    if let Some(selected) = selected {
        option.selected = selected;
    }

    ctx.settings()
        .edit_custom_option(folder, option.clone())
        .await?;
    Ok(option)
}

/// `container-architecture` and `-container-architecture` both name
/// `--container-architecture`
fn canonical_flag(flag: &str) -> String {
    format!("--{}", flag.trim().trim_start_matches('-'))
}

fn format_option(option: &CustomOption) -> String {
    let mut text = format!("{} {}", checkbox(option.selected), option.name);
    if option.editable {
        match (option.value.is_empty(), option.default.as_deref()) {
            (false, _) => text.push_str(&format!(" {}", option.value)),
            (true, Some(default)) if !default.is_empty() => {
                text.push_str(&format!(" {default} (default)"))
            }
            _ => text.push_str(" <unset>"),
        }
    }
    text.push_str(&format!("  {}", option.description));
    text
}
