use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod loader;

pub use loader::ConfigLoader;

use crate::workflow::DEFAULT_WORKFLOWS_DIR;
use crate::{Error, Result};

pub const ENV_ACT_COMMAND: &str = "ACTBENCH_ACT_COMMAND";
pub const ENV_STATE_DIR: &str = "ACTBENCH_STATE_DIR";
pub const ENV_WORKFLOWS_DIR: &str = "ACTBENCH_WORKFLOWS_DIR";
pub const ENV_LOG_LEVEL: &str = "ACTBENCH_LOG_LEVEL";
pub const ENV_RUN_TIMEOUT: &str = "ACTBENCH_RUN_TIMEOUT";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "actbench", "actbench")
}

/// Directory holding settings, secrets, history and run logs
pub fn default_state_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
}

/// Location of `config.toml` when none is given explicitly
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActbenchConfig {
    /// Runner invocation, e.g. `act` or `gh act`
    pub act_command: String,
    pub state_dir: PathBuf,
    /// Workflow directory relative to each workspace folder
    pub workflows_dir: PathBuf,
    pub log_level: String,
    /// Seconds after which a run is killed and recorded as failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_timeout: Option<u64>,
}

impl Default for ActbenchConfig {
    fn default() -> Self {
        Self {
            act_command: "act".to_string(),
            state_dir: default_state_dir().unwrap_or_else(|_| PathBuf::from(".actbench")),
            workflows_dir: PathBuf::from(DEFAULT_WORKFLOWS_DIR),
            log_level: "info".to_string(),
            run_timeout: None,
        }
    }
}

impl ActbenchConfig {
    pub fn merge_env_vars(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any variable source
    pub fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(command) = lookup(ENV_ACT_COMMAND).filter(|v| !v.trim().is_empty()) {
            self.act_command = command;
        }

        if let Some(dir) = lookup(ENV_STATE_DIR).filter(|v| !v.is_empty()) {
            self.state_dir = PathBuf::from(dir);
        }

        if let Some(dir) = lookup(ENV_WORKFLOWS_DIR).filter(|v| !v.is_empty()) {
            self.workflows_dir = PathBuf::from(dir);
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
            self.log_level = level;
        }

        if let Some(raw) = lookup(ENV_RUN_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(0) => self.run_timeout = None,
                Ok(secs) => self.run_timeout = Some(secs),
                Err(_) => tracing::warn!("Ignoring invalid {}={:?}", ENV_RUN_TIMEOUT, raw),
            }
        }
    }

    pub fn run_timeout(&self) -> Option<std::time::Duration> {
        self.run_timeout
            .filter(|secs| *secs > 0)
            .map(std::time::Duration::from_secs)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ActbenchConfig::default();
        assert_eq!(config.act_command, "act");
        assert_eq!(config.workflows_dir, PathBuf::from(".github/workflows"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_ACT_COMMAND, "gh act"),
            (ENV_STATE_DIR, "/tmp/actbench"),
            (ENV_LOG_LEVEL, "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = ActbenchConfig::default();
        config.merge_vars(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.act_command, "gh act");
        assert_eq!(config.state_dir, PathBuf::from("/tmp/actbench"));
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/actbench/logs"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.workflows_dir, PathBuf::from(".github/workflows"));
    }

    #[test]
    fn test_run_timeout_override() {
        let mut config = ActbenchConfig::default();
        assert!(config.run_timeout().is_none());

        config.merge_vars(|key| (key == ENV_RUN_TIMEOUT).then(|| "90".to_string()));
        assert_eq!(config.run_timeout(), Some(std::time::Duration::from_secs(90)));

        config.merge_vars(|key| (key == ENV_RUN_TIMEOUT).then(|| "soon".to_string()));
        assert_eq!(config.run_timeout, Some(90));

        config.merge_vars(|key| (key == ENV_RUN_TIMEOUT).then(|| "0".to_string()));
        assert!(config.run_timeout().is_none());
    }

    #[test]
    fn test_blank_act_command_is_ignored() {
        let mut config = ActbenchConfig::default();
        config.merge_vars(|key| (key == ENV_ACT_COMMAND).then(|| "  ".to_string()));
        assert_eq!(config.act_command, "act");
    }
}
