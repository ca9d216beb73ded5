//! Deployment manifests: include expansion, validation and extraction.

pub mod extract;
pub mod include;
pub mod name;
pub mod path;
pub mod validate;

use serde_yaml::Value;

use crate::spec::{AgentSpec, AgentSystemSpec, McpServerSpec, Spec};
use crate::types::ResourceKind;

pub use extract::{ExtractError, extract_manifest};
pub use include::{INCLUDE_KEY, IncludeError, ResolvedManifest, resolve_manifest};
pub use path::{FieldPath, Segment};
pub use validate::{ValidationError, ValidationReport, validate_manifest};

/// Typed content of a manifest, each kind in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub mcp_servers: Vec<McpServerSpec>,
    pub agents: Vec<AgentSpec>,
    pub agent_systems: Vec<AgentSystemSpec>,
    /// Sections present in the document, in apply order.
    pub sections: Vec<ResourceKind>,
}

impl Manifest {
    pub fn has_section(&self, kind: ResourceKind) -> bool {
        self.sections.contains(&kind)
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::McpServer => self.mcp_servers.len(),
            ResourceKind::Agent => self.agents.len(),
            ResourceKind::AgentSystem => self.agent_systems.len(),
        }
    }

    /// Every spec in apply order: MCP servers, agents, then agent systems.
    pub fn specs(&self) -> impl Iterator<Item = Spec> + '_ {
        self.mcp_servers
            .iter()
            .cloned()
            .map(Spec::McpServer)
            .chain(self.agents.iter().cloned().map(Spec::Agent))
            .chain(self.agent_systems.iter().cloned().map(Spec::AgentSystem))
    }

    /// Keep only the given kinds.
    pub fn retain_kinds(&mut self, kinds: &[ResourceKind]) {
        if !kinds.contains(&ResourceKind::McpServer) {
            self.mcp_servers.clear();
        }
        if !kinds.contains(&ResourceKind::Agent) {
            self.agents.clear();
        }
        if !kinds.contains(&ResourceKind::AgentSystem) {
            self.agent_systems.clear();
        }
        self.sections.retain(|kind| kinds.contains(kind));
    }
}

/// Short name of a YAML node's type, for messages.
pub fn yaml_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
