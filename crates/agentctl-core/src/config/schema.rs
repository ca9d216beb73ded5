//! Configuration schema for config.toml
//!
//! ```toml
//! [api]
//! url = "https://ai.example.com"
//! project_id = "proj-123"
//! token = "..."
//!
//! [deploy]
//! page_size = 100
//! timeout_secs = 300
//! ```

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::http::HttpApiConfig;

pub const MAX_PAGE_SIZE: usize = 1000;

/// Root configuration structure for config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub deploy: DeploySection,
}

/// Remote platform access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    /// Base URL, e.g. `https://ai.example.com`
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub project_id: Option<String>,

    /// Bearer token
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Instance type attached to created agents
    #[serde(default)]
    pub instance_type_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploySection {
    /// Page size for catalog listing
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// End-to-end deadline; unset means no deadline
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> usize {
    100
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            url: None,
            project_id: None,
            token: None,
            request_timeout_secs: default_request_timeout_secs(),
            instance_type_id: None,
        }
    }
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.deploy.page_size) {
            anyhow::bail!(
                "deploy.page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.deploy.page_size
            );
        }
        if self.api.request_timeout_secs == 0 {
            anyhow::bail!("api.request_timeout_secs must be greater than 0");
        }
        if let Some(url) = &self.api.url {
            Url::parse(url).with_context(|| format!("Invalid api.url: '{}'", url))?;
        }
        Ok(())
    }

    /// Override fields from environment variables.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(super::ENV_API_URL) {
            self.api.url = Some(url);
        }
        if let Some(project_id) = non_empty(super::ENV_PROJECT_ID) {
            self.api.project_id = Some(project_id);
        }
        if let Some(token) = non_empty(super::ENV_TOKEN) {
            self.api.token = Some(token);
        }
        if let Some(instance_type_id) = non_empty(super::ENV_INSTANCE_TYPE_ID) {
            self.api.instance_type_id = Some(instance_type_id);
        }
    }

    /// HTTP capability settings, or `None` when url or project id is missing.
    pub fn http_api_config(&self) -> anyhow::Result<Option<HttpApiConfig>> {
        let (Some(url), Some(project_id)) = (&self.api.url, &self.api.project_id) else {
            return Ok(None);
        };
        let base_url = Url::parse(url).with_context(|| format!("Invalid api.url: '{}'", url))?;
        Ok(Some(HttpApiConfig {
            base_url,
            project_id: project_id.clone(),
            token: self.api.token.clone(),
            instance_type_id: self.api.instance_type_id.clone(),
            request_timeout: Duration::from_secs(self.api.request_timeout_secs),
        }))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.deploy.timeout_secs.map(Duration::from_secs)
    }
}
