//! Apply specs in the fixed MCP server → agent → agent system order.

use tokio_util::sync::CancellationToken;

use super::{DeployObserver, DeployResult, DeployStatus, Progress};
use crate::api::{CapabilityError, ResourceApi};
use crate::catalog::{Catalog, Catalogs, DRY_RUN_ID_PREFIX};
use crate::error::{DeployError, ResourceError};
use crate::manifest::Manifest;
use crate::resolve::ResolvedSpec;
use crate::spec::Spec;
use crate::types::{DeployMode, ResourceKind};

pub const DEFAULT_PAGE_SIZE: usize = 100;

pub struct Reconciler<'a> {
    api: &'a dyn ResourceApi,
    cancel: CancellationToken,
    page_size: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(api: &'a dyn ResourceApi, cancel: CancellationToken) -> Self {
        Self {
            api,
            cancel,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Run every spec of `manifest` in apply order.
    ///
    /// Validate-only returns no results and never touches the capability.
    /// Per-spec failures land in the result list; only catalog listing and
    /// cancellation before the first spec are fatal.
    pub async fn run(
        &self,
        manifest: &Manifest,
        mode: DeployMode,
        observer: &mut dyn DeployObserver,
    ) -> Result<Vec<DeployResult>, DeployError> {
        if mode == DeployMode::ValidateOnly {
            return Ok(Vec::new());
        }

        let mut catalogs = self.seed_catalogs(manifest).await?;
        let specs: Vec<Spec> = manifest.specs().collect();
        let total = specs.len();
        let mut results = Vec::with_capacity(total);

        for spec in specs {
            let result = if self.cancel.is_cancelled() {
                tracing::warn!(kind = %spec.kind(), name = spec.name(), "cancelled before apply");
                cancelled(&spec, format!("cancelled before {} '{}'", spec.kind(), spec.name()))
            } else {
                self.apply_one(spec, mode, &mut catalogs).await
            };

            let stop = result.status == DeployStatus::Cancelled;
            results.push(result);
            if let Some(result) = results.last() {
                observer.on_result(Progress {
                    position: results.len(),
                    total,
                    result,
                });
            }
            if stop {
                break;
            }
        }

        Ok(results)
    }

    /// List every catalog the manifest needs before anything is mutated.
    ///
    /// A kind is listed when it is declared (for the "already exists" note)
    /// or referenced by a declared kind.
    pub async fn seed_catalogs(&self, manifest: &Manifest) -> Result<Catalogs, DeployError> {
        let needed = |kind: ResourceKind| match kind {
            ResourceKind::McpServer => {
                manifest.has_section(ResourceKind::McpServer)
                    || manifest.has_section(ResourceKind::Agent)
            }
            ResourceKind::Agent => {
                manifest.has_section(ResourceKind::Agent)
                    || manifest.has_section(ResourceKind::AgentSystem)
            }
            ResourceKind::AgentSystem => manifest.has_section(ResourceKind::AgentSystem),
        };

        let mut catalogs = Catalogs::default();
        for kind in ResourceKind::ALL.into_iter().filter(|k| needed(*k)) {
            if self.cancel.is_cancelled() {
                return Err(DeployError::Cancelled);
            }
            let catalog = Catalog::fetch(self.api, kind, self.page_size, &self.cancel)
                .await
                .map_err(|source| match source {
                    CapabilityError::Cancelled => DeployError::Cancelled,
                    source => DeployError::Catalog { kind, source },
                })?;
            tracing::info!(kind = %kind, existing = catalog.len(), "loaded catalog");
            catalogs.set(catalog);
        }
        Ok(catalogs)
    }

    async fn apply_one(&self, spec: Spec, mode: DeployMode, catalogs: &mut Catalogs) -> DeployResult {
        let resolved = ResolvedSpec::resolve(spec, catalogs);
        if !resolved.is_resolved() {
            let error = ResourceError::UnresolvedReferences(resolved.errors.clone());
            tracing::warn!(
                kind = %resolved.spec.kind(),
                name = resolved.spec.name(),
                %error,
                "unresolved references"
            );
            return failed(&resolved.spec, error);
        }

        let spec = &resolved.spec;
        let (kind, name) = (spec.kind(), spec.name());

        if mode == DeployMode::DryRun {
            let catalog = catalogs.get_mut(kind);
            let message = match catalog.get(name) {
                Some(id) => format!("would update existing {kind} '{name}' ({id})"),
                None => {
                    catalog.insert(name, format!("{DRY_RUN_ID_PREFIX}{name}"));
                    format!("would deploy {kind} '{name}'")
                }
            };
            tracing::info!(kind = %kind, name, "dry-run");
            return DeployResult {
                kind,
                index: spec.index(),
                name: name.to_string(),
                status: DeployStatus::WouldDeploy,
                message,
                id: None,
                error: None,
            };
        }

        match self.create(&resolved).await {
            Ok(id) => {
                tracing::info!(kind = %kind, name, %id, "deployed");
                catalogs.get_mut(kind).insert(name, id.clone());
                DeployResult {
                    kind,
                    index: spec.index(),
                    name: name.to_string(),
                    status: DeployStatus::Deployed,
                    message: format!("deployed {kind} '{name}' ({id})"),
                    id: Some(id),
                    error: None,
                }
            }
            Err(CapabilityError::Cancelled) => {
                tracing::warn!(kind = %kind, name, "cancelled during apply");
                cancelled(spec, format!("cancelled while deploying {kind} '{name}'"))
            }
            Err(error) => {
                tracing::warn!(kind = %kind, name, %error, "deploy failed");
                failed(spec, ResourceError::Capability(error))
            }
        }
    }

    async fn create(&self, resolved: &ResolvedSpec) -> Result<String, CapabilityError> {
        let ids = resolved.ids.clone();
        match &resolved.spec {
            Spec::McpServer(spec) => self.api.create_mcp_server(&spec.payload(), &self.cancel).await,
            Spec::Agent(spec) => self.api.create_agent(&spec.payload(ids), &self.cancel).await,
            Spec::AgentSystem(spec) => {
                self.api
                    .create_agent_system(&spec.payload(ids), &self.cancel)
                    .await
            }
        }
    }
}

fn failed(spec: &Spec, error: ResourceError) -> DeployResult {
    DeployResult {
        kind: spec.kind(),
        index: spec.index(),
        name: spec.name().to_string(),
        status: DeployStatus::Failed,
        message: format!("failed to deploy {} '{}': {error}", spec.kind(), spec.name()),
        id: None,
        error: Some(error),
    }
}

fn cancelled(spec: &Spec, message: String) -> DeployResult {
    DeployResult {
        kind: spec.kind(),
        index: spec.index(),
        name: spec.name().to_string(),
        status: DeployStatus::Cancelled,
        message,
        id: None,
        error: Some(ResourceError::Capability(CapabilityError::Cancelled)),
    }
}
