//! Pure merge functions behind settings reconciliation

use std::collections::HashMap;

use super::{Category, CustomOption, Setting, SettingFile};
use crate::workflow::ExtractedName;

/// Entries identified by name within a partition
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Setting {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for SettingFile {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for CustomOption {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Pure: merge freshly discovered names with the persisted list.
///
/// The result follows discovery order. Names still referenced keep their
/// persisted entry, new names get an empty unselected entry, and persisted
/// names that are no longer referenced are dropped.
pub fn merge_settings(
    category: Category,
    discovered: &[ExtractedName],
    persisted: &[Setting],
) -> Vec<Setting> {
    let previous: HashMap<&str, &Setting> = persisted.iter().map(|s| (s.name.as_str(), s)).collect();

    let mut merged: Vec<Setting> = Vec::with_capacity(discovered.len());
    for entry in discovered {
        if merged.iter().any(|s| s.name == entry.name) {
            continue;
        }
        let setting = match previous.get(entry.name.as_str()) {
            Some(existing) => (*existing).clone(),
            None => Setting::new(category, entry.name.clone()),
        };
        merged.push(setting);
    }
    merged
}

/// Pure: carry persisted values and selection onto the option catalog.
///
/// Catalog order and descriptions win; persisted flags missing from the
/// catalog are dropped.
pub fn merge_options(catalog: Vec<CustomOption>, persisted: &[CustomOption]) -> Vec<CustomOption> {
    catalog
        .into_iter()
        .map(|mut option| {
            if let Some(existing) = persisted.iter().find(|p| p.name == option.name) {
                option.value = existing.value.clone();
                option.selected = existing.selected;
            }
            option
        })
        .collect()
}

/// Pure: replace the entry with the same name, or append it.
///
/// Returns `true` when an existing entry was replaced.
pub fn upsert_by_name<T: Named>(entries: &mut Vec<T>, entry: T) -> bool {
    match entries.iter_mut().find(|e| e.name() == entry.name()) {
        Some(existing) => {
            *existing = entry;
            true
        }
        None => {
            entries.push(entry);
            false
        }
    }
}

/// Pure: leave at most `selected` selected
pub fn select_single_file(files: &mut [SettingFile], selected: &str) {
    for file in files.iter_mut() {
        if file.name != selected {
            file.selected = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::default_options;

    fn discovered(names: &[&str]) -> Vec<ExtractedName> {
        names.iter().map(|n| ExtractedName::new(*n)).collect()
    }

    #[test]
    fn test_new_names_start_empty_and_unselected() {
        let merged = merge_settings(Category::Variables, &discovered(&["A", "B"]), &[]);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|s| s.value.is_empty() && !s.selected));
    }

    #[test]
    fn test_persisted_values_carry_forward() {
        let persisted = vec![Setting::new(Category::Variables, "A")
            .with_value("1")
            .selected(true)];
        let merged = merge_settings(Category::Variables, &discovered(&["B", "A"]), &persisted);

        assert_eq!(merged[0].name, "B");
        assert_eq!(merged[1], persisted[0]);
    }

    #[test]
    fn test_stale_names_are_dropped() {
        let persisted = vec![
            Setting::new(Category::Secrets, "OLD").with_value("x"),
            Setting::new(Category::Secrets, "KEEP").with_value("y"),
        ];
        let merged = merge_settings(Category::Secrets, &discovered(&["KEEP"]), &persisted);
        assert_eq!(merged, vec![persisted[1].clone()]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let names = discovered(&["A", "B", "A"]);
        let first = merge_settings(Category::Inputs, &names, &[]);
        let second = merge_settings(Category::Inputs, &names, &first);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_upsert_replaces_or_appends() {
        let mut entries = vec![Setting::new(Category::Variables, "A")];

        let replaced = upsert_by_name(
            &mut entries,
            Setting::new(Category::Variables, "A").with_value("new"),
        );
        assert!(replaced);
        assert_eq!(entries[0].value, "new");

        let replaced = upsert_by_name(&mut entries, Setting::new(Category::Variables, "B"));
        assert!(!replaced);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_select_single_file() {
        let mut files = vec![
            SettingFile {
                selected: true,
                ..SettingFile::new("a", "/a.env")
            },
            SettingFile {
                selected: true,
                ..SettingFile::new("b", "/b.env")
            },
        ];
        select_single_file(&mut files, "b");
        assert!(!files[0].selected);
        assert!(files[1].selected);
    }

    #[test]
    fn test_merge_options_keeps_catalog_order() {
        let catalog = default_options();
        let mut persisted = catalog.last().cloned().unwrap();
        persisted.selected = true;
        persisted.value = "custom".into();
        let stale = CustomOption {
            name: "--removed-flag".into(),
            ..persisted.clone()
        };

        let merged = merge_options(catalog.clone(), &[stale, persisted.clone()]);
        assert_eq!(merged.len(), catalog.len());
        assert_eq!(merged.last().unwrap().value, "custom");
        assert!(merged.last().unwrap().selected);
        assert!(merged.iter().all(|o| o.name != "--removed-flag"));
    }
}
