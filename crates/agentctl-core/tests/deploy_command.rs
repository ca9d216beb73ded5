//! End-to-end deploy pipeline: files on disk through to the fake capability.

mod support;

use std::time::Duration;

use agentctl_core::api::ResourceApi;
use agentctl_core::commands::{DeployCommand, DeployOptions, DeployReport};
use agentctl_core::deploy::{DeployObserver, DeployStatus, Progress};
use agentctl_core::error::DeployError;
use agentctl_core::manifest::IncludeError;
use agentctl_core::types::{DeployMode, ResourceKind};
use support::{FakeApi, write_files};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

async fn execute(
    dir: &TempDir,
    options: DeployOptions,
    api: Option<&dyn ResourceApi>,
) -> Result<DeployReport, DeployError> {
    let mut observer = |_: Progress<'_>| {};
    let observer: &mut dyn DeployObserver = &mut observer;
    DeployCommand::new(dir.path().to_path_buf())
        .execute(&options, api, CancellationToken::new(), observer)
        .await
}

#[tokio::test]
async fn include_cycle_aborts_before_any_call() {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[
            ("deploy.yaml", "agents:\n  \"!include\": parts/a.yaml\n"),
            ("parts/a.yaml", "\"!include\": ../deploy.yaml\n"),
        ],
    );
    let api = FakeApi::new();

    let err = execute(&temp, DeployOptions::all(), Some(&api))
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Include(IncludeError::Cycle { .. })));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn duplicate_names_are_reported_at_both_positions() {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[(
            "mcp-servers.yaml",
            "mcp-servers:\n  - name: pg-db\n  - name: pg-db\n",
        )],
    );
    let api = FakeApi::new();

    let err = execute(
        &temp,
        DeployOptions::kind(ResourceKind::McpServer),
        Some(&api),
    )
    .await
    .unwrap_err();

    let DeployError::Validation(report) = err else {
        panic!("expected validation failure, got {err:?}");
    };
    let fields: Vec<String> = report.errors.iter().map(|e| e.field.to_string()).collect();
    assert_eq!(fields, vec!["mcp-servers[0].name", "mcp-servers[1].name"]);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn validate_only_reports_malformed_names_without_calls() {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[(
            "agents.yaml",
            "agents:\n  - name: Bad_Name\n    llm_options: {provider: openai}\n",
        )],
    );
    let api = FakeApi::new();

    let err = execute(
        &temp,
        DeployOptions::kind(ResourceKind::Agent).with_mode(DeployMode::ValidateOnly),
        Some(&api),
    )
    .await
    .unwrap_err();

    let DeployError::Validation(report) = err else {
        panic!("expected validation failure, got {err:?}");
    };
    assert_eq!(report.len(), 1);
    assert_eq!(report.errors[0].field.to_string(), "agents[0].name");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn validate_only_needs_no_capability() {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[(
            "ai-agents.yaml",
            "mcp-servers:\n  - name: pg-db\n  - name: redis\nagents:\n  - name: helper\n    llm_options: {provider: openai}\n",
        )],
    );

    let report = execute(
        &temp,
        DeployOptions::all().with_mode(DeployMode::ValidateOnly),
        None,
    )
    .await
    .unwrap();

    assert!(report.results.is_empty());
    assert!(report.is_success());
    assert_eq!(report.declared.get(&ResourceKind::McpServer), Some(&2));
    assert_eq!(report.declared.get(&ResourceKind::Agent), Some(&1));
    assert_eq!(report.declared.get(&ResourceKind::AgentSystem), None);
}

#[tokio::test]
async fn dry_run_without_capability_is_rejected() {
    let temp = TempDir::new().unwrap();
    write_files(temp.path(), &[("mcp-servers.yaml", "mcp-servers:\n  - name: pg-db\n")]);

    let err = execute(
        &temp,
        DeployOptions::kind(ResourceKind::McpServer).with_mode(DeployMode::DryRun),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        DeployError::ApiRequired {
            mode: DeployMode::DryRun
        }
    ));
}

#[tokio::test]
async fn deploy_all_follows_includes_across_directories() {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[
            (
                "deploy.yaml",
                "mcp-servers: !include parts/servers.yaml\nagents:\n  \"!include\": parts/agents.yaml\n",
            ),
            ("parts/servers.yaml", "- name: pg-db\n"),
            (
                "parts/agents.yaml",
                "- name: helper\n  llm_options: {provider: openai}\n  mcp_servers: [pg-db]\n",
            ),
        ],
    );
    let api = FakeApi::new();

    let report = execute(&temp, DeployOptions::all(), Some(&api))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(api.created_names(), vec!["pg-db", "helper"]);
    assert_eq!(report.files.len(), 3);
    assert_eq!(report.summary.total, 2);
}

#[tokio::test]
async fn per_kind_deploy_skips_other_sections() {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[(
            "stack.yaml",
            "mcp-servers:\n  - name: pg-db\nagents:\n  - name: helper\n    llm_options: {provider: openai}\n",
        )],
    );
    let api = FakeApi::new();

    let report = execute(
        &temp,
        DeployOptions::kind(ResourceKind::Agent).with_file("stack.yaml"),
        Some(&api),
    )
    .await
    .unwrap();

    assert_eq!(api.created_names(), vec!["helper"]);
    assert_eq!(report.declared.len(), 1);
    assert_eq!(report.results[0].kind, ResourceKind::Agent);
}

#[tokio::test]
async fn deadline_cancels_an_in_flight_create() {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[(
            "mcp-servers.yaml",
            "mcp-servers:\n  - name: slow-one\n  - name: slow-two\n",
        )],
    );
    let api = FakeApi::new().with_create_delay(Duration::from_secs(30));

    let report = execute(
        &temp,
        DeployOptions::kind(ResourceKind::McpServer).with_timeout(Some(Duration::from_millis(50))),
        Some(&api),
    )
    .await
    .unwrap();

    let statuses: Vec<DeployStatus> = report.results.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![DeployStatus::Cancelled]);
    assert!(!report.is_success());
    assert_eq!(api.created_names(), vec!["slow-one"]);
}

#[tokio::test]
async fn missing_default_manifest_lists_candidates() {
    let temp = TempDir::new().unwrap();
    let err = execute(&temp, DeployOptions::kind(ResourceKind::AgentSystem), None)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::NoManifest { .. }));
    assert!(err.to_string().contains("systems.yaml, systems.yml"));
}
