//! Cross-reference resolution: agent → MCP server and system → agent names to ids.

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{Catalog, Catalogs};
use crate::manifest::FieldPath;
use crate::spec::Spec;
use crate::types::ResourceKind;

/// A referenced name that no catalog knows.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} '{spec}': {target} '{reference}' not found ({field})")]
pub struct NameResolutionError {
    /// Kind of the referring spec.
    pub kind: ResourceKind,
    pub index: usize,
    pub spec: String,
    pub field: FieldPath,
    pub reference: String,
    /// Kind the reference should point at.
    pub target: ResourceKind,
}

/// A spec together with the ids its references resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSpec {
    pub spec: Spec,
    /// Ids in the order of the declared names; missing names are left out.
    pub ids: Vec<String>,
    pub errors: Vec<NameResolutionError>,
}

impl ResolvedSpec {
    /// Resolve one spec's references against the current catalogs.
    pub fn resolve(spec: Spec, catalogs: &Catalogs) -> Self {
        let (ids, errors) = match &spec {
            Spec::McpServer(_) => (Vec::new(), Vec::new()),
            Spec::Agent(agent) => lookup(
                &spec,
                "mcp_servers",
                &agent.mcp_servers,
                catalogs.get(ResourceKind::McpServer),
            ),
            Spec::AgentSystem(system) => lookup(
                &spec,
                "agents",
                &system.agents,
                catalogs.get(ResourceKind::Agent),
            ),
        };
        Self { spec, ids, errors }
    }

    pub fn is_resolved(&self) -> bool {
        self.errors.is_empty()
    }
}

fn lookup(
    spec: &Spec,
    field: &str,
    names: &[String],
    catalog: &Catalog,
) -> (Vec<String>, Vec<NameResolutionError>) {
    let base = FieldPath::root()
        .key(spec.kind().section())
        .index(spec.index())
        .key(field);
    let mut ids = Vec::with_capacity(names.len());
    let mut errors = Vec::new();

    for (position, name) in names.iter().enumerate() {
        match catalog.get(name) {
            Some(id) => ids.push(id.to_string()),
            None => errors.push(NameResolutionError {
                kind: spec.kind(),
                index: spec.index(),
                spec: spec.name().to_string(),
                field: base.index(position),
                reference: name.clone(),
                target: catalog.kind(),
            }),
        }
    }
    (ids, errors)
}

/// Resolve a batch of specs against fixed catalogs.
///
/// Every spec is attempted so all misses are reported together.
pub fn resolve_references(
    specs: impl IntoIterator<Item = Spec>,
    catalogs: &Catalogs,
) -> (Vec<ResolvedSpec>, Vec<NameResolutionError>) {
    let resolved: Vec<ResolvedSpec> = specs
        .into_iter()
        .map(|spec| ResolvedSpec::resolve(spec, catalogs))
        .collect();
    let errors = resolved
        .iter()
        .flat_map(|r| r.errors.iter().cloned())
        .collect();
    (resolved, errors)
}
