//! High-level commands for agentctl operations.
//!
//! These are the entry points the CLI calls; they own file lookup and
//! pipeline sequencing so frontends only render reports.

pub mod deploy;

pub use deploy::{DeployCommand, DeployOptions, DeployReport, DeployTarget, LoadedManifest};
