//! agentctl Core Library
//!
//! Declarative deployment of MCP servers, agents and agent systems from
//! YAML manifests: include expansion, validation, name resolution and
//! reconciliation against a remote platform.

pub mod api;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod context;
pub mod deploy;
pub mod error;
pub mod manifest;
pub mod resolve;
pub mod spec;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Manifest
    pub use crate::manifest::{
        FieldPath, IncludeError, Manifest, ResolvedManifest, ValidationError, ValidationReport,
        extract_manifest, resolve_manifest, validate_manifest,
    };
    pub use crate::spec::{AgentSpec, AgentSystemSpec, McpServerSpec, Spec};

    // Capability
    pub use crate::api::{CapabilityError, HttpResourceApi, ResourceApi};
    pub use crate::catalog::{Catalog, Catalogs};
    pub use crate::resolve::{NameResolutionError, ResolvedSpec};

    // Deploy
    pub use crate::commands::{DeployCommand, DeployOptions, DeployReport, DeployTarget};
    pub use crate::deploy::{DeployObserver, DeployResult, DeployStatus, DeploySummary, Progress};
    pub use crate::error::{DeployError, ResourceError};
    pub use crate::types::{DeployMode, ResourceKind};

    // Configuration
    pub use crate::config::{ClientConfig, ConfigStore};
    pub use crate::context::AppContext;
}
