//! Remote resource capability: list and create MCP servers, agents and agent systems.
//!
//! The reconciler only talks to [`ResourceApi`]; [`http::HttpResourceApi`] is the
//! production implementation and tests substitute their own.

pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Mapping;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use http::{HttpApiConfig, HttpResourceApi};

/// One page request against a list operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

/// A resource that already exists on the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteResource {
    pub id: String,
    pub name: String,
    #[serde(
        default,
        alias = "created_at",
        rename = "createdAt",
        deserialize_with = "lenient_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of a list operation, with the total the platform reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "data", default)]
    pub items: Vec<RemoteResource>,
    #[serde(default)]
    pub total: usize,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|t| t.with_timezone(&Utc))))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McpServerPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: Mapping,
    /// Resolved MCP server ids.
    pub mcp_servers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSystemPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: Mapping,
    /// Resolved agent ids.
    pub agents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("API is not configured: {0}")]
    NotConfigured(String),
}

/// Operations the reconciler needs from the platform.
///
/// Every call takes the run's cancellation token; an implementation that
/// observes cancellation returns [`CapabilityError::Cancelled`].
#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn list_mcp_servers(
        &self,
        page: PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Page, CapabilityError>;

    async fn list_agents(
        &self,
        page: PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Page, CapabilityError>;

    async fn list_agent_systems(
        &self,
        page: PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Page, CapabilityError>;

    /// Returns the id of the created server.
    async fn create_mcp_server(
        &self,
        payload: &McpServerPayload,
        cancel: &CancellationToken,
    ) -> Result<String, CapabilityError>;

    async fn create_agent(
        &self,
        payload: &AgentPayload,
        cancel: &CancellationToken,
    ) -> Result<String, CapabilityError>;

    async fn create_agent_system(
        &self,
        payload: &AgentSystemPayload,
        cancel: &CancellationToken,
    ) -> Result<String, CapabilityError>;
}
