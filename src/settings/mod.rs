//! Run settings: values extracted from workflows plus user-declared files and options
//!
//! - `reconcile` - Pure merge of discovered names with persisted entries
//! - `options` - Built-in catalog of `act` command-line options
//! - `manager` - Store-backed operations per workspace folder

pub mod manager;
pub mod options;
pub mod reconcile;

pub use manager::SettingsManager;
pub use options::default_options;
pub use reconcile::{merge_options, merge_settings, select_single_file, upsert_by_name, Named};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::workflow::PatternKind;

/// A partition of the settings store with its own extraction pattern and render flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Secrets,
    Variables,
    Inputs,
    Runners,
    Payload,
    Options,
}

/// Static description of how a category is discovered, stored and rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDescriptor {
    pub category: Category,
    /// Extraction pattern, `None` for user-declared categories
    pub pattern: Option<PatternKind>,
    pub storage_key: &'static str,
    /// Flag for `NAME=value` injections
    pub value_flag: Option<&'static str>,
    /// Flag for file injections
    pub file_flag: Option<&'static str>,
    /// Persisted in the protected store
    pub protected: bool,
    /// Selecting one file deselects the others
    pub single_file: bool,
}

const DESCRIPTORS: [CategoryDescriptor; 6] = [
    CategoryDescriptor {
        category: Category::Secrets,
        pattern: Some(PatternKind::Secrets),
        storage_key: "secrets",
        value_flag: Some("--secret"),
        file_flag: Some("--secret-file"),
        protected: true,
        single_file: true,
    },
    CategoryDescriptor {
        category: Category::Variables,
        pattern: Some(PatternKind::Variables),
        storage_key: "variables",
        value_flag: Some("--var"),
        file_flag: Some("--var-file"),
        protected: false,
        single_file: true,
    },
    CategoryDescriptor {
        category: Category::Inputs,
        pattern: Some(PatternKind::Inputs),
        storage_key: "inputs",
        value_flag: Some("--input"),
        file_flag: Some("--input-file"),
        protected: false,
        single_file: true,
    },
    CategoryDescriptor {
        category: Category::Runners,
        pattern: Some(PatternKind::Runners),
        storage_key: "runners",
        value_flag: Some("--platform"),
        file_flag: None,
        protected: false,
        single_file: false,
    },
    CategoryDescriptor {
        category: Category::Payload,
        pattern: None,
        storage_key: "payload",
        value_flag: None,
        file_flag: Some("--eventpath"),
        protected: false,
        single_file: true,
    },
    CategoryDescriptor {
        category: Category::Options,
        pattern: None,
        storage_key: "options",
        value_flag: None,
        file_flag: None,
        protected: false,
        single_file: false,
    },
];

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Secrets,
        Category::Variables,
        Category::Inputs,
        Category::Runners,
        Category::Payload,
        Category::Options,
    ];

    /// Order in which injection flags are rendered
    pub const INJECTION_ORDER: [Category; 5] = [
        Category::Secrets,
        Category::Variables,
        Category::Inputs,
        Category::Runners,
        Category::Payload,
    ];

    pub fn descriptor(&self) -> &'static CategoryDescriptor {
        let index = match self {
            Category::Secrets => 0,
            Category::Variables => 1,
            Category::Inputs => 2,
            Category::Runners => 3,
            Category::Payload => 4,
            Category::Options => 5,
        };
        &DESCRIPTORS[index]
    }

    pub fn as_str(&self) -> &'static str {
        self.descriptor().storage_key
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "secrets" | "secret" => Ok(Category::Secrets),
            "variables" | "variable" | "vars" | "var" => Ok(Category::Variables),
            "inputs" | "input" => Ok(Category::Inputs),
            "runners" | "runner" | "platforms" => Ok(Category::Runners),
            "payload" | "payloads" => Ok(Category::Payload),
            "options" | "option" => Ok(Category::Options),
            other => Err(format!(
                "unknown category '{other}' (expected secrets, variables, inputs, runners, payload or options)"
            )),
        }
    }
}

/// Whether a value is shown or masked in listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Show,
    Hide,
}

/// One named value injected into a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub password: bool,
}

impl Setting {
    /// A fresh, unselected entry with the defaults of its category
    pub fn new(category: Category, name: impl Into<String>) -> Self {
        let secret = category == Category::Secrets;
        Self {
            name: name.into(),
            value: String::new(),
            selected: false,
            visibility: Some(if secret {
                Visibility::Hide
            } else {
                Visibility::Show
            }),
            password: secret,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Value as it may appear in listings
    pub fn display_value(&self) -> String {
        match self.visibility {
            Some(Visibility::Hide) if !self.value.is_empty() => "•".repeat(8),
            _ => self.value.clone(),
        }
    }
}

/// A file supplying many values at once (env-file, event payload)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingFile {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub selected: bool,
}

impl SettingFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            selected: false,
        }
    }
}

/// A runner command-line flag exposed to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomOption {
    /// Canonical flag, e.g. `--container-architecture`
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub selected: bool,
    /// Takes a value; non-editable options are bare switches
    #[serde(default)]
    pub editable: bool,
    /// Value is rendered as `--flag=value`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub boolean: bool,
    #[serde(default)]
    pub group: String,
}

impl CustomOption {
    /// Value passed to the runner: the current one, else the default
    pub fn effective_value(&self) -> Option<&str> {
        if !self.value.is_empty() {
            Some(&self.value)
        } else {
            self.default.as_deref().filter(|d| !d.is_empty())
        }
    }

    /// Command-line tokens for this option
    pub fn to_args(&self) -> Vec<String> {
        match (self.editable, self.effective_value()) {
            (true, Some(value)) if self.boolean => vec![format!("{}={}", self.name, value)],
            (true, Some(value)) => vec![self.name.clone(), value.to_string()],
            _ => vec![self.name.clone()],
        }
    }
}

/// Everything one category contributes to a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySettings {
    pub settings: Vec<Setting>,
    pub files: Vec<SettingFile>,
}

/// Reconciled settings of a folder, the input of command synthesis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub categories: HashMap<Category, CategorySettings>,
    pub options: Vec<CustomOption>,
}

impl ResolvedSettings {
    pub fn get(&self, category: Category) -> Option<&CategorySettings> {
        self.categories.get(&category)
    }

    pub fn insert_settings(&mut self, category: Category, settings: Vec<Setting>) {
        self.categories.entry(category).or_default().settings = settings;
    }

    pub fn insert_files(&mut self, category: Category, files: Vec<SettingFile>) {
        self.categories.entry(category).or_default().files = files;
    }

    /// Values of selected password-like settings, for redaction
    pub fn sensitive_values(&self) -> Vec<String> {
        self.categories
            .values()
            .flat_map(|c| c.settings.iter())
            .filter(|s| s.selected && s.password && !s.value.is_empty())
            .map(|s| s.value.clone())
            .collect()
    }
}
