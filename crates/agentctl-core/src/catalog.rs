//! In-memory name → id maps of remote resources, one per kind.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use crate::api::{CapabilityError, Page, PageRequest, ResourceApi};
use crate::types::ResourceKind;

/// Id prefix recorded for resources that a dry-run would have created.
pub const DRY_RUN_ID_PREFIX: &str = "dry-run:";

#[derive(Debug, Clone)]
pub struct Catalog {
    kind: ResourceKind,
    ids: HashMap<String, String>,
}

impl Catalog {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            ids: HashMap::new(),
        }
    }

    /// Seed a catalog by paging through the kind's list operation.
    ///
    /// Stops once the reported total has been read or a page comes back empty.
    /// When the platform lists a name twice, the first id wins.
    pub async fn fetch(
        api: &dyn ResourceApi,
        kind: ResourceKind,
        page_size: usize,
        cancel: &CancellationToken,
    ) -> Result<Self, CapabilityError> {
        let mut catalog = Self::new(kind);
        let limit = page_size.max(1);
        let mut offset = 0;

        loop {
            let page = list_page(api, kind, PageRequest { limit, offset }, cancel).await?;
            if page.items.is_empty() {
                break;
            }
            offset += page.items.len();
            for item in page.items {
                catalog.ids.entry(item.name).or_insert(item.id);
            }
            if offset >= page.total {
                break;
            }
        }

        tracing::debug!(kind = %kind, entries = catalog.len(), "catalog seeded");
        Ok(catalog)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.ids.get(name).map(String::as_str)
    }

    /// Record a resource created (or planned) during this run.
    pub fn insert(&mut self, name: impl Into<String>, id: impl Into<String>) {
        self.ids.insert(name.into(), id.into());
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

async fn list_page(
    api: &dyn ResourceApi,
    kind: ResourceKind,
    page: PageRequest,
    cancel: &CancellationToken,
) -> Result<Page, CapabilityError> {
    match kind {
        ResourceKind::McpServer => api.list_mcp_servers(page, cancel).await,
        ResourceKind::Agent => api.list_agents(page, cancel).await,
        ResourceKind::AgentSystem => api.list_agent_systems(page, cancel).await,
    }
}

/// The three per-kind catalogs of one run.
#[derive(Debug, Clone)]
pub struct Catalogs {
    mcp_servers: Catalog,
    agents: Catalog,
    agent_systems: Catalog,
}

impl Default for Catalogs {
    fn default() -> Self {
        Self {
            mcp_servers: Catalog::new(ResourceKind::McpServer),
            agents: Catalog::new(ResourceKind::Agent),
            agent_systems: Catalog::new(ResourceKind::AgentSystem),
        }
    }
}

impl Catalogs {
    pub fn get(&self, kind: ResourceKind) -> &Catalog {
        match kind {
            ResourceKind::McpServer => &self.mcp_servers,
            ResourceKind::Agent => &self.agents,
            ResourceKind::AgentSystem => &self.agent_systems,
        }
    }

    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut Catalog {
        match kind {
            ResourceKind::McpServer => &mut self.mcp_servers,
            ResourceKind::Agent => &mut self.agents,
            ResourceKind::AgentSystem => &mut self.agent_systems,
        }
    }

    pub fn set(&mut self, catalog: Catalog) {
        let kind = catalog.kind();
        *self.get_mut(kind) = catalog;
    }
}
