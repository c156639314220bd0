//! Settings command implementation

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use super::{checkbox, print_folder_heading, single_folder};
use crate::cli::args::SettingsCommands;
use crate::settings::{Category, Setting};
use crate::ActContext;

pub async fn run_settings_command(
    ctx: &ActContext,
    folders: &[PathBuf],
    command: SettingsCommands,
) -> Result<()> {
    match command {
        SettingsCommands::List { category, reveal } => {
            ensure_value_category(category)?;
            for folder in folders {
                print_folder_heading(folder, folders);
                let settings = ctx.settings().list_settings(folder, category).await?;
                if settings.is_empty() {
                    println!("No {category} referenced by the workflows");
                }
                for setting in &settings {
                    println!("{}", format_setting(setting, reveal));
                }
            }
            Ok(())
        }
        SettingsCommands::Set {
            category,
            name,
            value,
            selection,
        } => {
            ensure_value_category(category)?;
            let folder = single_folder(folders)?;
            let setting = update_setting(ctx, folder, category, &name, value, selection.requested())
                .await?;
            println!("✓ {}", format_setting(&setting, false));
            Ok(())
        }
    }
}

/// Apply a value and selection change to one setting and persist it
pub async fn update_setting(
    ctx: &ActContext,
    folder: &Path,
    category: Category,
    name: &str,
    value: Option<String>,
    selected: Option<bool>,
) -> Result<Setting> {
    let mut setting = ctx
        .settings()
        .list_settings(folder, category)
        .await?
        .into_iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| Setting::new(category, name));

    if let Some(value) = value {
        setting.value = value;
    }
    if let Some(selected) = selected {
        setting.selected = selected;
    }

    ctx.settings()
        .edit_setting(folder, setting.clone(), category)
        .await?;
    Ok(setting)
}

fn ensure_value_category(category: Category) -> Result<()> {
    if category.descriptor().pattern.is_none() {
        bail!(
            "{category} are not extracted from workflows; use `actbench {}` instead",
            if category == Category::Options {
                "options"
            } else {
                "files"
            }
        );
    }
    Ok(())
}

fn format_setting(setting: &Setting, reveal: bool) -> String {
    let value = if reveal {
        setting.value.clone()
    } else {
        setting.display_value()
    };
    format!("{} {} = {}", checkbox(setting.selected), setting.name, value)
}
