//! Deploy command implementation.
//!
//! Locates the manifest, expands includes, validates and extracts it, then
//! hands the selected kinds to the reconciler.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::api::ResourceApi;
use crate::deploy::reconciler::DEFAULT_PAGE_SIZE;
use crate::deploy::{DeployObserver, DeployResult, DeploySummary, Reconciler};
use crate::error::DeployError;
use crate::manifest::{
    Manifest, ValidationReport, extract_manifest, resolve_manifest, validate_manifest,
};
use crate::types::{DeployMode, ResourceKind};

/// Default manifest names for `deploy all`, in search order.
const UNIVERSAL_FILES: &[&str] = &[
    "ai-agents.yaml",
    "ai-agents.yml",
    "deploy.yaml",
    "deploy.yml",
    "config.yaml",
    "config.yml",
];

/// What to deploy: one kind or every section of the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeployTarget {
    Kind(ResourceKind),
    All,
}

impl DeployTarget {
    /// Conventional manifest names searched in the working directory.
    pub fn default_files(self) -> &'static [&'static str] {
        match self {
            DeployTarget::Kind(ResourceKind::McpServer) => &["mcp-servers.yaml", "mcp-servers.yml"],
            DeployTarget::Kind(ResourceKind::Agent) => &["agents.yaml", "agents.yml"],
            DeployTarget::Kind(ResourceKind::AgentSystem) => &["systems.yaml", "systems.yml"],
            DeployTarget::All => UNIVERSAL_FILES,
        }
    }

    pub fn kinds(self) -> Vec<ResourceKind> {
        match self {
            DeployTarget::Kind(kind) => vec![kind],
            DeployTarget::All => ResourceKind::ALL.to_vec(),
        }
    }

    pub fn label(self) -> String {
        match self {
            DeployTarget::Kind(kind) => format!("{}s", kind.label()),
            DeployTarget::All => "all resources".to_string(),
        }
    }
}

/// Options for the deploy command
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub target: DeployTarget,
    /// Manifest path; defaults to the first existing conventional file
    pub file: Option<PathBuf>,
    pub mode: DeployMode,
    /// End-to-end deadline
    pub timeout: Option<Duration>,
    /// Page size for catalog listing
    pub page_size: usize,
}

impl DeployOptions {
    pub fn new(target: DeployTarget) -> Self {
        Self {
            target,
            file: None,
            mode: DeployMode::Apply,
            timeout: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn kind(kind: ResourceKind) -> Self {
        Self::new(DeployTarget::Kind(kind))
    }

    pub fn all() -> Self {
        Self::new(DeployTarget::All)
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_mode(mut self, mode: DeployMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

/// A manifest that passed include expansion and validation.
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub path: PathBuf,
    /// Every file read, root first.
    pub files: Vec<PathBuf>,
    pub manifest: Manifest,
}

/// Report from a deploy operation
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub target: DeployTarget,
    pub mode: DeployMode,
    pub manifest: PathBuf,
    pub files: Vec<PathBuf>,
    /// Specs declared per selected kind.
    pub declared: BTreeMap<ResourceKind, usize>,
    pub results: Vec<DeployResult>,
    pub summary: DeploySummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DeployReport {
    pub fn is_success(&self) -> bool {
        self.summary.is_success()
    }
}

/// Deploy command orchestrator
#[derive(Debug, Clone)]
pub struct DeployCommand {
    working_dir: PathBuf,
}

impl DeployCommand {
    pub fn new(working_dir: PathBuf) -> Self {
        Self { working_dir }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The explicit file, or the first conventional file that exists.
    pub fn locate_manifest(&self, options: &DeployOptions) -> Result<PathBuf, DeployError> {
        if let Some(file) = &options.file {
            return Ok(self.working_dir.join(file));
        }
        let candidates = options.target.default_files();
        candidates
            .iter()
            .map(|name| self.working_dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| DeployError::NoManifest {
                target: options.target.label(),
                candidates: candidates.iter().map(|s| s.to_string()).collect(),
            })
    }

    /// Expand, validate and extract the manifest; check the target's sections.
    pub fn load(&self, options: &DeployOptions) -> Result<LoadedManifest, DeployError> {
        let path = self.locate_manifest(options)?;
        tracing::info!(manifest = %path.display(), "loading manifest");

        let resolved = resolve_manifest(&path)?;
        let report: ValidationReport = validate_manifest(&resolved.root);
        if !report.is_valid() {
            tracing::debug!(errors = report.len(), "manifest failed validation");
            return Err(DeployError::Validation(report));
        }
        let manifest = extract_manifest(&resolved.root)?;

        match options.target {
            DeployTarget::Kind(kind) if !manifest.has_section(kind) => {
                return Err(DeployError::MissingSection { kind });
            }
            DeployTarget::All if manifest.sections.is_empty() => {
                return Err(DeployError::NoSections);
            }
            _ => {}
        }

        Ok(LoadedManifest {
            path,
            files: resolved.files,
            manifest,
        })
    }

    /// Run the whole pipeline.
    ///
    /// `api` may be `None` only in validate-only mode. `cancel` is the
    /// caller's abort signal; the configured timeout cancels a child of it.
    pub async fn execute(
        &self,
        options: &DeployOptions,
        api: Option<&dyn ResourceApi>,
        cancel: CancellationToken,
        observer: &mut dyn DeployObserver,
    ) -> Result<DeployReport, DeployError> {
        let started_at = Utc::now();
        let loaded = self.load(options)?;
        let mut manifest = loaded.manifest;
        manifest.retain_kinds(&options.target.kinds());
        let declared: BTreeMap<ResourceKind, usize> = manifest
            .sections
            .iter()
            .map(|kind| (*kind, manifest.count(*kind)))
            .collect();

        let results = match (options.mode, api) {
            (DeployMode::ValidateOnly, _) => Vec::new(),
            (mode, None) => return Err(DeployError::ApiRequired { mode }),
            (mode, Some(api)) => {
                let run_token = cancel.child_token();
                let deadline = options
                    .timeout
                    .map(|timeout| spawn_deadline(timeout, run_token.clone()));
                let outcome = Reconciler::new(api, run_token)
                    .with_page_size(options.page_size)
                    .run(&manifest, mode, observer)
                    .await;
                if let Some(deadline) = deadline {
                    deadline.abort();
                }
                outcome?
            }
        };

        let summary = DeploySummary::from_results(&results);
        tracing::info!(
            successful = summary.successful,
            failed = summary.failed,
            total = summary.total,
            "deploy finished"
        );

        Ok(DeployReport {
            target: options.target,
            mode: options.mode,
            manifest: loaded.path,
            files: loaded.files,
            declared,
            results,
            summary,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

fn spawn_deadline(timeout: Duration, token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                tracing::warn!(timeout_secs = timeout.as_secs(), "deadline reached, cancelling");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}
