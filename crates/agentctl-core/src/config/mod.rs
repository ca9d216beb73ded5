//! Client configuration: API access and deploy defaults.
//!
//! Loaded from `$CONFIG_DIR/agentctl/config.toml` (or an explicit path),
//! then overridden by `AGENTCTL_*` environment variables.

pub mod parser;
pub mod schema;
pub mod store;

pub use parser::{parse_config_toml, parse_config_toml_str};
pub use schema::{ApiSection, ClientConfig, DeploySection, MAX_PAGE_SIZE};
pub use store::ConfigStore;

pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_API_URL: &str = "AGENTCTL_API_URL";
pub const ENV_PROJECT_ID: &str = "AGENTCTL_PROJECT_ID";
pub const ENV_TOKEN: &str = "AGENTCTL_TOKEN";
pub const ENV_INSTANCE_TYPE_ID: &str = "AGENTCTL_INSTANCE_TYPE_ID";
