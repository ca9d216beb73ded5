//! Shared core types used across the manifest, catalog and deploy layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three kinds of managed resources, in apply order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Managed MCP server.
    McpServer,
    /// Agent bundling an LLM provider and its MCP servers.
    Agent,
    /// Named grouping of agents.
    AgentSystem,
}

impl ResourceKind {
    /// All kinds in the fixed apply order.
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::McpServer,
        ResourceKind::Agent,
        ResourceKind::AgentSystem,
    ];

    /// Top-level manifest key holding this kind's sequence.
    pub fn section(self) -> &'static str {
        match self {
            ResourceKind::McpServer => "mcp-servers",
            ResourceKind::Agent => "agents",
            ResourceKind::AgentSystem => "agent-systems",
        }
    }

    /// Look up a kind by its manifest section key.
    pub fn from_section(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.section() == key)
    }

    /// Human-readable label used in messages.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::McpServer => "MCP server",
            ResourceKind::Agent => "agent",
            ResourceKind::AgentSystem => "agent system",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How far the deploy pipeline goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeployMode {
    /// Resolve and validate only; the capability is never touched.
    ValidateOnly,
    /// Resolve references against live catalogs but perform no mutation.
    DryRun,
    /// Create resources through the capability.
    #[default]
    Apply,
}

impl DeployMode {
    /// Whether this mode needs the remote capability at all.
    pub fn needs_api(self) -> bool {
        self != DeployMode::ValidateOnly
    }
}

impl fmt::Display for DeployMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeployMode::ValidateOnly => "validate-only",
            DeployMode::DryRun => "dry-run",
            DeployMode::Apply => "apply",
        })
    }
}
