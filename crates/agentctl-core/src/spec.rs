//! Typed resource specs extracted from a validated manifest.

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

use crate::api::{AgentPayload, AgentSystemPayload, McpServerPayload};
use crate::types::ResourceKind;

/// Options key the agent's `llm_options` are submitted under.
pub const LLM_OPTIONS_KEY: &str = "llm";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpServerSpec {
    /// Position in the `mcp-servers` sequence.
    #[serde(skip)]
    pub index: usize,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Opaque, passed through to the capability.
    #[serde(default)]
    pub options: Option<Mapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSpec {
    #[serde(skip)]
    pub index: usize,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub llm_options: Mapping,
    #[serde(default)]
    pub options: Option<Mapping>,
    /// MCP servers referenced by name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mcp_servers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSystemSpec {
    #[serde(skip)]
    pub index: usize,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Agents referenced by name.
    pub agents: Vec<String>,
    #[serde(default)]
    pub options: Option<Mapping>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl McpServerSpec {
    pub fn payload(&self) -> McpServerPayload {
        McpServerPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            options: self.options.clone().unwrap_or_default(),
        }
    }
}

impl AgentSpec {
    /// Options as submitted: the declared options with `llm_options` under `llm`.
    pub fn submitted_options(&self) -> Mapping {
        let mut options = self.options.clone().unwrap_or_default();
        options.insert(
            Value::String(LLM_OPTIONS_KEY.to_string()),
            Value::Mapping(self.llm_options.clone()),
        );
        options
    }

    pub fn payload(&self, mcp_server_ids: Vec<String>) -> AgentPayload {
        AgentPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            options: self.submitted_options(),
            mcp_servers: mcp_server_ids,
        }
    }
}

impl AgentSystemSpec {
    pub fn payload(&self, agent_ids: Vec<String>) -> AgentSystemPayload {
        AgentSystemPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            options: self.options.clone().unwrap_or_default(),
            agents: agent_ids,
        }
    }
}

/// One declared resource of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    McpServer(McpServerSpec),
    Agent(AgentSpec),
    AgentSystem(AgentSystemSpec),
}

impl Spec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Spec::McpServer(_) => ResourceKind::McpServer,
            Spec::Agent(_) => ResourceKind::Agent,
            Spec::AgentSystem(_) => ResourceKind::AgentSystem,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Spec::McpServer(spec) => &spec.name,
            Spec::Agent(spec) => &spec.name,
            Spec::AgentSystem(spec) => &spec.name,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Spec::McpServer(spec) => spec.index,
            Spec::Agent(spec) => spec.index,
            Spec::AgentSystem(spec) => spec.index,
        }
    }
}
