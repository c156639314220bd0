use std::path::Path;
use tokio::fs;

use super::{default_config_path, ActbenchConfig};
use crate::{Error, Result};

/// Builds the effective configuration: defaults, then `config.toml`, then
/// environment overrides
pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist; the default location is optional
    pub async fn load(explicit_path: Option<&Path>) -> Result<ActbenchConfig> {
        let mut config = match explicit_path {
            Some(path) => Self::load_file(path).await?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load_file(&path).await?,
                _ => ActbenchConfig::default(),
            },
        };

        config.merge_env_vars();
        tracing::debug!(
            "Effective config: act_command='{}', state_dir={}",
            config.act_command,
            config.state_dir.display()
        );
        Ok(config)
    }

    pub async fn load_file(path: &Path) -> Result<ActbenchConfig> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<ActbenchConfig> {
        Ok(toml::from_str(content)?)
    }
}
