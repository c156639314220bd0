//! Store-backed settings operations per workspace folder

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::options::default_options;
use super::reconcile::{merge_options, merge_settings, select_single_file, upsert_by_name};
use super::{Category, CustomOption, ResolvedSettings, Setting, SettingFile};
use crate::storage::{Namespace, Partition, PartitionLocks, StoreSet};
use crate::workflow::{dedup_names, extract, WorkflowIndex};
use crate::{Error, Result};

/// Reconciles extracted names with persisted values and serves edits
#[derive(Clone)]
pub struct SettingsManager {
    stores: StoreSet,
    index: WorkflowIndex,
    locks: PartitionLocks,
}

impl SettingsManager {
    pub fn new(stores: StoreSet, index: WorkflowIndex) -> Self {
        Self {
            stores,
            index,
            locks: PartitionLocks::new(),
        }
    }

    pub fn index(&self) -> &WorkflowIndex {
        &self.index
    }

    fn settings_partition(folder: &Path, category: Category) -> Partition {
        Partition::new(Namespace::Settings, folder, Some(category.as_str()))
    }

    fn files_partition(folder: &Path, category: Category) -> Partition {
        Partition::new(Namespace::SettingFiles, folder, Some(category.as_str()))
    }

    fn options_partition(folder: &Path) -> Partition {
        Partition::new(Namespace::Options, folder, None)
    }

    /// Merge the names referenced by the folder's workflows with the
    /// persisted list, persist the result as the new baseline and return it.
    ///
    /// Categories without an extraction pattern return the persisted list.
    pub async fn reconcile(&self, folder: &Path, category: Category) -> Result<Vec<Setting>> {
        let descriptor = category.descriptor();
        let partition = Self::settings_partition(folder, category);

        if category == Category::Options {
            return Err(Error::Settings(
                "options are listed with list_custom_options".to_string(),
            ));
        }

        let _guard = self.locks.lock(&partition).await;
        let persisted: Vec<Setting> = self
            .stores
            .load_list(&partition, descriptor.protected)
            .await?;

        let Some(pattern) = descriptor.pattern else {
            return Ok(persisted);
        };

        let workflows = self.index.scan(folder).await?;
        let discovered = dedup_names(
            workflows
                .iter()
                .filter_map(|workflow| workflow.text())
                .flat_map(|text| extract(text, pattern)),
        );

        let merged = merge_settings(category, &discovered, &persisted);
        self.stores
            .save_list(&partition, &merged, descriptor.protected)
            .await?;

        debug!(
            "Reconciled {} {} for {} ({} persisted before)",
            merged.len(),
            category,
            folder.display(),
            persisted.len()
        );
        Ok(merged)
    }

    /// Reconcile one category across several workspace folders
    pub async fn reconcile_all(
        &self,
        folders: &[PathBuf],
        category: Category,
    ) -> Result<BTreeMap<PathBuf, Vec<Setting>>> {
        let mut result = BTreeMap::new();
        for folder in folders {
            result.insert(folder.clone(), self.reconcile(folder, category).await?);
        }
        Ok(result)
    }

    /// Current settings of a category, as a presentation layer would poll them
    pub async fn list_settings(&self, folder: &Path, category: Category) -> Result<Vec<Setting>> {
        self.reconcile(folder, category).await
    }

    /// Upsert one setting by name
    pub async fn edit_setting(
        &self,
        folder: &Path,
        setting: Setting,
        category: Category,
    ) -> Result<()> {
        let descriptor = category.descriptor();
        if descriptor.value_flag.is_none() {
            return Err(Error::Settings(format!(
                "{category} does not hold individual values"
            )));
        }

        let partition = Self::settings_partition(folder, category);
        let _guard = self.locks.lock(&partition).await;
        let mut settings: Vec<Setting> = self
            .stores
            .load_list(&partition, descriptor.protected)
            .await?;

        let name = setting.name.clone();
        let replaced = upsert_by_name(&mut settings, setting);
        self.stores
            .save_list(&partition, &settings, descriptor.protected)
            .await?;

        debug!(
            "{} {} setting '{}' for {}",
            if replaced { "Updated" } else { "Added" },
            category,
            name,
            folder.display()
        );
        Ok(())
    }

    pub async fn list_setting_files(
        &self,
        folder: &Path,
        category: Category,
    ) -> Result<Vec<SettingFile>> {
        let descriptor = Self::file_category(category)?;
        let partition = Self::files_partition(folder, category);
        Ok(self
            .stores
            .load_list(&partition, descriptor.protected)
            .await?)
    }

    /// Add a file, or replace the one with the same name
    pub async fn add_setting_file(
        &self,
        folder: &Path,
        category: Category,
        file: SettingFile,
    ) -> Result<()> {
        self.edit_setting_file(folder, category, file).await
    }

    /// Upsert a file by name; in single-file categories selecting it
    /// deselects every other file
    pub async fn edit_setting_file(
        &self,
        folder: &Path,
        category: Category,
        file: SettingFile,
    ) -> Result<()> {
        let descriptor = Self::file_category(category)?;
        let partition = Self::files_partition(folder, category);
        let _guard = self.locks.lock(&partition).await;
        let mut files: Vec<SettingFile> = self
            .stores
            .load_list(&partition, descriptor.protected)
            .await?;

        let name = file.name.clone();
        let selected = file.selected;
        upsert_by_name(&mut files, file);
        if selected && descriptor.single_file {
            select_single_file(&mut files, &name);
        }

        self.stores
            .save_list(&partition, &files, descriptor.protected)
            .await?;
        Ok(())
    }

    /// Remove a file by name; `false` if it was not there
    pub async fn remove_setting_file(
        &self,
        folder: &Path,
        category: Category,
        name: &str,
    ) -> Result<bool> {
        let descriptor = Self::file_category(category)?;
        let partition = Self::files_partition(folder, category);
        let _guard = self.locks.lock(&partition).await;
        let mut files: Vec<SettingFile> = self
            .stores
            .load_list(&partition, descriptor.protected)
            .await?;

        let before = files.len();
        files.retain(|f| f.name != name);
        if files.len() == before {
            return Ok(false);
        }

        self.stores
            .save_list(&partition, &files, descriptor.protected)
            .await?;
        Ok(true)
    }

    /// The option catalog with this folder's values and selection
    pub async fn list_custom_options(&self, folder: &Path) -> Result<Vec<CustomOption>> {
        let partition = Self::options_partition(folder);
        let persisted: Vec<CustomOption> = self.stores.load_list(&partition, false).await?;
        Ok(merge_options(default_options(), &persisted))
    }

    /// Upsert one option by flag name
    pub async fn edit_custom_option(&self, folder: &Path, option: CustomOption) -> Result<()> {
        if !default_options().iter().any(|o| o.name == option.name) {
            return Err(Error::NotFound(format!("option {}", option.name)));
        }

        let partition = Self::options_partition(folder);
        let _guard = self.locks.lock(&partition).await;
        let mut options: Vec<CustomOption> = self.stores.load_list(&partition, false).await?;
        upsert_by_name(&mut options, option);
        self.stores.save_list(&partition, &options, false).await?;
        Ok(())
    }

    /// Reconcile every category and load every file list of a folder
    pub async fn resolve(&self, folder: &Path) -> Result<ResolvedSettings> {
        let mut resolved = ResolvedSettings::default();
        for category in Category::INJECTION_ORDER {
            let descriptor = category.descriptor();
            if descriptor.pattern.is_some() {
                resolved.insert_settings(category, self.reconcile(folder, category).await?);
            }
            if descriptor.file_flag.is_some() {
                resolved.insert_files(category, self.list_setting_files(folder, category).await?);
            }
        }
        resolved.options = self.list_custom_options(folder).await?;
        Ok(resolved)
    }

    fn file_category(category: Category) -> Result<&'static super::CategoryDescriptor> {
        let descriptor = category.descriptor();
        if descriptor.file_flag.is_none() {
            return Err(Error::Settings(format!("{category} does not accept files")));
        }
        Ok(descriptor)
    }
}
