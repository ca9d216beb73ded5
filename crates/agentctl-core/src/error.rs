//! Error types shared by the deploy pipeline.

use thiserror::Error;

use crate::api::CapabilityError;
use crate::manifest::{ExtractError, IncludeError, ValidationReport};
use crate::resolve::NameResolutionError;
use crate::types::{DeployMode, ResourceKind};

/// Why a single spec could not be deployed. Never aborts the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceError {
    #[error("{}", join_references(.0))]
    UnresolvedReferences(Vec<NameResolutionError>),

    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

fn join_references(errors: &[NameResolutionError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} '{}' not found ({})", e.target, e.reference, e.field))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Fatal pipeline errors. Raised before any mutation except `Cancelled`.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("no manifest found for {target}; looked for {}", .candidates.join(", "))]
    NoManifest {
        target: String,
        candidates: Vec<String>,
    },

    #[error(transparent)]
    Include(#[from] IncludeError),

    #[error("manifest is invalid ({} error(s))", .0.len())]
    Validation(ValidationReport),

    #[error("manifest has no '{}' section", .kind.section())]
    MissingSection { kind: ResourceKind },

    #[error("manifest declares none of: mcp-servers, agents, agent-systems")]
    NoSections,

    #[error("failed to list existing {}s: {source}", .kind.label())]
    Catalog {
        kind: ResourceKind,
        #[source]
        source: CapabilityError,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("deployment cancelled")]
    Cancelled,

    #[error("{mode} needs API access; set api.url and api.project_id")]
    ApiRequired { mode: DeployMode },
}
