//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::api::HttpResourceApi;
use crate::commands::DeployCommand;
use crate::config::{ClientConfig, ConfigStore};

/// Unified application context for dependency injection.
///
/// The CLI creates this once and builds commands and the capability from it.
#[derive(Debug, Clone)]
pub struct AppContext {
    working_dir: PathBuf,
    config_store: ConfigStore,
}

impl AppContext {
    /// Create a new context with explicit paths.
    pub fn new(working_dir: PathBuf, config_store: ConfigStore) -> Self {
        Self {
            working_dir,
            config_store,
        }
    }

    /// Current directory plus the given config file, or the default location.
    pub fn from_env(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let working_dir =
            std::env::current_dir().context("Failed to determine the working directory")?;
        let config_store = match config_path {
            Some(path) => ConfigStore::from_path(path),
            None => ConfigStore::from_default_location()?,
        };
        Ok(Self::new(working_dir, config_store))
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.config_store
    }

    /// Config file merged with `AGENTCTL_*` overrides.
    pub fn load_config(&self) -> anyhow::Result<ClientConfig> {
        self.config_store.load_with_env()
    }

    pub fn deploy_command(&self) -> DeployCommand {
        DeployCommand::new(self.working_dir.clone())
    }

    /// The HTTP capability, or `None` when API access is not configured.
    pub fn resource_api(&self, config: &ClientConfig) -> anyhow::Result<Option<HttpResourceApi>> {
        let Some(http) = config.http_api_config()? else {
            return Ok(None);
        };
        let api = HttpResourceApi::new(http).context("Failed to create API client")?;
        Ok(Some(api))
    }
}
