//! Config store for loading config.toml.

use std::path::{Path, PathBuf};

use super::{ClientConfig, CONFIG_FILE_NAME, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store at `$CONFIG_DIR/agentctl/config.toml`.
    pub fn from_default_location() -> anyhow::Result<Self> {
        let global_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("agentctl");
        Ok(Self::from_path(global_dir.join(CONFIG_FILE_NAME)))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the file, or defaults when it does not exist.
    pub fn load(&self) -> anyhow::Result<ClientConfig> {
        if !self.config_path.exists() {
            return Ok(ClientConfig::new());
        }
        parser::parse_config_toml(&self.config_path)
    }

    /// Load the file and apply environment overrides.
    pub fn load_with_env(&self) -> anyhow::Result<ClientConfig> {
        let mut config = self.load()?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }
}
