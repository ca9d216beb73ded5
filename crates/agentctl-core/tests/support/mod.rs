//! Recording in-memory `ResourceApi` for pipeline tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use agentctl_core::api::{
    AgentPayload, AgentSystemPayload, CapabilityError, McpServerPayload, Page, PageRequest,
    RemoteResource, ResourceApi,
};
use agentctl_core::types::ResourceKind;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(ResourceKind, PageRequest),
    CreateMcpServer(McpServerPayload),
    CreateAgent(AgentPayload),
    CreateAgentSystem(AgentSystemPayload),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::List(..))
    }

    pub fn created_name(&self) -> Option<&str> {
        match self {
            Call::List(..) => None,
            Call::CreateMcpServer(p) => Some(&p.name),
            Call::CreateAgent(p) => Some(&p.name),
            Call::CreateAgentSystem(p) => Some(&p.name),
        }
    }
}

#[derive(Default)]
pub struct FakeApi {
    existing: HashMap<ResourceKind, Vec<RemoteResource>>,
    failing_creates: HashSet<String>,
    failing_list: Option<ResourceKind>,
    cancel_after: Option<(String, CancellationToken)>,
    create_delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
    created: Mutex<usize>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resource that already exists remotely.
    pub fn with_existing(mut self, kind: ResourceKind, name: &str, id: &str) -> Self {
        self.existing.entry(kind).or_default().push(RemoteResource {
            id: id.to_string(),
            name: name.to_string(),
            created_at: None,
        });
        self
    }

    /// Creating `name` fails with an API error.
    pub fn failing_create(mut self, name: &str) -> Self {
        self.failing_creates.insert(name.to_string());
        self
    }

    pub fn failing_list(mut self, kind: ResourceKind) -> Self {
        self.failing_list = Some(kind);
        self
    }

    /// Cancel `token` right after `name` has been created.
    pub fn cancel_after(mut self, name: &str, token: CancellationToken) -> Self {
        self.cancel_after = Some((name.to_string(), token));
        self
    }

    /// Every create waits this long unless cancelled first.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn created_names(&self) -> Vec<String> {
        self.mutations()
            .iter()
            .filter_map(|c| c.created_name().map(str::to_string))
            .collect()
    }

    pub fn list_calls(&self, kind: ResourceKind) -> Vec<PageRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::List(k, page) if k == kind => Some(page),
                _ => None,
            })
            .collect()
    }

    fn list(&self, kind: ResourceKind, page: PageRequest) -> Result<Page, CapabilityError> {
        self.calls.lock().unwrap().push(Call::List(kind, page));
        if self.failing_list == Some(kind) {
            return Err(CapabilityError::Transport("connection refused".to_string()));
        }
        let all = self.existing.get(&kind).cloned().unwrap_or_default();
        let items = all
            .iter()
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect();
        Ok(Page {
            items,
            total: all.len(),
        })
    }

    async fn create(&self, call: Call, cancel: &CancellationToken) -> Result<String, CapabilityError> {
        let name = call.created_name().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(call);

        if let Some(delay) = self.create_delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(CapabilityError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if self.failing_creates.contains(&name) {
            return Err(CapabilityError::Api {
                status: 500,
                message: format!("backend rejected {name}"),
            });
        }

        let id = {
            let mut created = self.created.lock().unwrap();
            *created += 1;
            format!("id-{}-{}", *created, name)
        };
        if let Some((after, token)) = &self.cancel_after {
            if *after == name {
                token.cancel();
            }
        }
        Ok(id)
    }
}

#[async_trait]
impl ResourceApi for FakeApi {
    async fn list_mcp_servers(
        &self,
        page: PageRequest,
        _cancel: &CancellationToken,
    ) -> Result<Page, CapabilityError> {
        self.list(ResourceKind::McpServer, page)
    }

    async fn list_agents(
        &self,
        page: PageRequest,
        _cancel: &CancellationToken,
    ) -> Result<Page, CapabilityError> {
        self.list(ResourceKind::Agent, page)
    }

    async fn list_agent_systems(
        &self,
        page: PageRequest,
        _cancel: &CancellationToken,
    ) -> Result<Page, CapabilityError> {
        self.list(ResourceKind::AgentSystem, page)
    }

    async fn create_mcp_server(
        &self,
        payload: &McpServerPayload,
        cancel: &CancellationToken,
    ) -> Result<String, CapabilityError> {
        self.create(Call::CreateMcpServer(payload.clone()), cancel)
            .await
    }

    async fn create_agent(
        &self,
        payload: &AgentPayload,
        cancel: &CancellationToken,
    ) -> Result<String, CapabilityError> {
        self.create(Call::CreateAgent(payload.clone()), cancel).await
    }

    async fn create_agent_system(
        &self,
        payload: &AgentSystemPayload,
        cancel: &CancellationToken,
    ) -> Result<String, CapabilityError> {
        self.create(Call::CreateAgentSystem(payload.clone()), cancel)
            .await
    }
}

/// Write `files` (relative path, content) under `dir`.
pub fn write_files(dir: &std::path::Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = dir.join(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}
