//! Reconciliation of extracted specs against the remote platform.

pub mod reconciler;

use serde::{Serialize, Serializer};

use crate::error::ResourceError;
use crate::types::ResourceKind;

pub use reconciler::Reconciler;

/// Outcome of one spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeployStatus {
    /// Created (or updated) through the capability.
    Deployed,
    /// Dry-run: everything resolved, nothing was sent.
    WouldDeploy,
    Failed,
    /// The run stopped here; this and later specs were not applied.
    Cancelled,
}

impl DeployStatus {
    pub fn is_success(self) -> bool {
        matches!(self, DeployStatus::Deployed | DeployStatus::WouldDeploy)
    }
}

/// Per-spec result, emitted in apply order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployResult {
    pub kind: ResourceKind,
    /// Position in the kind's manifest section.
    pub index: usize,
    pub name: String,
    pub status: DeployStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<ResourceError>,
}

fn serialize_error<S: Serializer>(
    error: &Option<ResourceError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.collect_str(error),
        None => serializer.serialize_none(),
    }
}

impl DeployResult {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Aggregate totals over a result list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeploySummary {
    pub successful: usize,
    /// Includes the cancelled record, if any.
    pub failed: usize,
    pub total: usize,
}

impl DeploySummary {
    pub fn from_results(results: &[DeployResult]) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();
        Self {
            successful,
            failed: results.len() - successful,
            total: results.len(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Streaming progress signal, one per emitted result.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// 1-based position in the run.
    pub position: usize,
    /// Number of specs the run intends to apply.
    pub total: usize,
    pub result: &'a DeployResult,
}

/// Receives results as they are produced.
pub trait DeployObserver {
    fn on_result(&mut self, progress: Progress<'_>);
}

impl<F> DeployObserver for F
where
    F: FnMut(Progress<'_>),
{
    fn on_result(&mut self, progress: Progress<'_>) {
        self(progress)
    }
}
