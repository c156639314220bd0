//! Placeholder extraction from workflow text
//!
//! Finds the externally supplied names a workflow refers to:
//! - `secrets.NAME` inside `${{ }}` expressions
//! - `vars.NAME`, optionally compared with `== <literal>`
//! - `inputs.NAME` / `github.event.inputs.NAME`, optionally compared
//! - `runs-on:` runner labels
//!
//! Extraction never fails; malformed text just yields fewer matches.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Regex for `${{ ... }}` expression blocks, possibly spanning lines
static EXPRESSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\{\{(.*?)\}\}").expect("Valid regex pattern"));

static SECRET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\w.])secrets\.([A-Za-z_][A-Za-z0-9_]*)").expect("Valid regex pattern")
});

static VARIABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:^|[^\w.])vars\.([A-Za-z_][A-Za-z0-9_]*)(?:\s*==\s*('[^']*'|"[^"]*"|[^\s)&|]+))?"#,
    )
    .expect("Valid regex pattern")
});

static INPUT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:^|[^\w.])(?:github\.event\.)?inputs\.([A-Za-z_][A-Za-z0-9_-]*)(?:\s*==\s*('[^']*'|"[^"]*"|[^\s)&|]+))?"#,
    )
    .expect("Valid regex pattern")
});

static RUNS_ON_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:-[ \t]+)?runs-on:[ \t]*(.+?)[ \t]*$").expect("Valid regex pattern")
});

/// Which kind of placeholder to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Secrets,
    Variables,
    Inputs,
    Runners,
}

/// A discovered name and the literal it was compared against, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedName {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<String>,
}

impl ExtractedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comparison: None,
        }
    }

    pub fn with_comparison(name: impl Into<String>, comparison: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comparison: Some(comparison.into()),
        }
    }
}

/// Pure: extract all names of one kind from workflow text.
///
/// Results are de-duplicated by name in first-seen order; the first
/// comparison literal seen for a name is kept.
pub fn extract(text: &str, kind: PatternKind) -> Vec<ExtractedName> {
    let found = match kind {
        PatternKind::Secrets => extract_from_expressions(text, &SECRET_REGEX),
        PatternKind::Variables => extract_from_expressions(text, &VARIABLE_REGEX),
        PatternKind::Inputs => extract_from_expressions(text, &INPUT_REGEX),
        PatternKind::Runners => extract_runner_labels(text),
    };
    dedup_names(found)
}

/// Collapse duplicates keeping first occurrence order
pub fn dedup_names<I>(names: I) -> Vec<ExtractedName>
where
    I: IntoIterator<Item = ExtractedName>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|entry| seen.insert(entry.name.clone()))
        .collect()
}

fn extract_from_expressions(text: &str, pattern: &Regex) -> Vec<ExtractedName> {
    EXPRESSION_REGEX
        .captures_iter(text)
        .filter_map(|block| block.get(1))
        .flat_map(|body| {
            pattern
                .captures_iter(body.as_str())
                .filter_map(|caps| {
                    let name = caps.get(1)?.as_str().to_string();
                    let comparison = caps.get(2).map(|m| m.as_str().to_string());
                    Some(ExtractedName { name, comparison })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn extract_runner_labels(text: &str) -> Vec<ExtractedName> {
    RUNS_ON_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .flat_map(|value| parse_runs_on(value.as_str()))
        .map(ExtractedName::new)
        .collect()
}

/// Split a `runs-on:` value into labels, skipping expressions and mappings
fn parse_runs_on(raw: &str) -> Vec<String> {
    let value = strip_comment(raw).trim();
    if value.is_empty() || value.contains("${{") || value.starts_with('{') {
        return Vec::new();
    }

    let items: Vec<&str> = match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        Some(inner) => inner.split(',').collect(),
        None => vec![value],
    };

    items
        .into_iter()
        .map(|item| unquote(item.trim()).to_string())
        .filter(|label| !label.is_empty())
        .collect()
}

fn strip_comment(value: &str) -> &str {
    match value.find(" #") {
        Some(pos) => &value[..pos],
        None => value,
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
