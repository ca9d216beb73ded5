//! agentctl - declarative deployment of MCP servers, agents and agent systems
//!
//! Usage:
//!   agentctl deploy mcp [file]          # deploy MCP servers
//!   agentctl deploy agents -d           # dry-run agents
//!   agentctl deploy all deploy.yaml     # everything, in dependency order
//!   agentctl validate [file]            # check a manifest without the API

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agentctl_core::api::ResourceApi;
use agentctl_core::commands::{DeployOptions, DeployReport, DeployTarget};
use agentctl_core::config::ClientConfig;
use agentctl_core::context::AppContext;
use agentctl_core::deploy::{DeployStatus, Progress};
use agentctl_core::error::DeployError;
use agentctl_core::types::{DeployMode, ResourceKind};

#[derive(Parser)]
#[command(name = "agentctl", version)]
#[command(about = "Deploy MCP servers, agents and agent systems from YAML manifests", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy resources declared in a manifest
    ///
    /// Without a file, the first existing conventional file is used:
    /// mcp-servers.yaml, agents.yaml, systems.yaml, or for `all`
    /// ai-agents.yaml, deploy.yaml, config.yaml (.yml also accepted).
    Deploy(DeployArgs),

    /// Expand includes and validate a manifest; never contacts the API
    Validate(ValidateArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable lines
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum KindArg {
    /// MCP servers
    Mcp,
    /// Agents
    Agents,
    /// Agent systems
    System,
    /// Every section, in dependency order
    All,
}

impl From<KindArg> for DeployTarget {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Mcp => DeployTarget::Kind(ResourceKind::McpServer),
            KindArg::Agents => DeployTarget::Kind(ResourceKind::Agent),
            KindArg::System => DeployTarget::Kind(ResourceKind::AgentSystem),
            KindArg::All => DeployTarget::All,
        }
    }
}

#[derive(Args)]
struct DeployArgs {
    /// What to deploy
    kind: KindArg,
    /// Manifest file
    file: Option<PathBuf>,
    /// Manifest file (alternative to the positional argument)
    #[arg(short = 'f', long = "file", value_name = "PATH", conflicts_with = "file")]
    file_flag: Option<PathBuf>,
    /// Resolve references against the platform without creating anything
    #[arg(short = 'd', long)]
    dry_run: bool,
    /// Only expand includes and validate; wins over --dry-run
    #[arg(long)]
    validate_only: bool,
    /// End-to-end deadline in seconds (overrides deploy.timeout_secs)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Output format
    #[arg(short = 'o', long, default_value = "table")]
    format: OutputFormat,
}

impl DeployArgs {
    fn mode(&self) -> DeployMode {
        if self.validate_only {
            DeployMode::ValidateOnly
        } else if self.dry_run {
            DeployMode::DryRun
        } else {
            DeployMode::Apply
        }
    }
}

#[derive(Args)]
struct ValidateArgs {
    /// Manifest file
    file: Option<PathBuf>,
    /// Manifest file (alternative to the positional argument)
    #[arg(short = 'f', long = "file", value_name = "PATH", conflicts_with = "file")]
    file_flag: Option<PathBuf>,
    /// Output format
    #[arg(short = 'o', long, default_value = "table")]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "agentctl=debug,agentctl_core=debug"
    } else {
        "agentctl=warn,agentctl_core=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ctx = AppContext::from_env(cli.config.clone())?;
    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let exit_code = match cli.command {
        Commands::Deploy(args) => {
            let request = DeployRequest {
                target: args.kind.into(),
                file: args.file.clone().or_else(|| args.file_flag.clone()),
                mode: args.mode(),
                timeout: args.timeout,
                format: args.format,
            };
            run_deploy(&ctx, request, cli.verbose, cancel).await?
        }
        Commands::Validate(args) => {
            let request = DeployRequest {
                target: DeployTarget::All,
                file: args.file.or(args.file_flag),
                mode: DeployMode::ValidateOnly,
                timeout: None,
                format: args.format,
            };
            run_deploy(&ctx, request, cli.verbose, cancel).await?
        }
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{} interrupt received, stopping after the current resource", style("!").yellow());
            cancel.cancel();
        }
    });
}

struct DeployRequest {
    target: DeployTarget,
    file: Option<PathBuf>,
    mode: DeployMode,
    timeout: Option<u64>,
    format: OutputFormat,
}

/// Validate-only runs never touch the API, so they ignore the config file.
fn load_config_for(ctx: &AppContext, mode: DeployMode) -> Result<ClientConfig> {
    if mode.needs_api() {
        ctx.load_config()
    } else {
        Ok(ClientConfig::new())
    }
}

async fn run_deploy(
    ctx: &AppContext,
    request: DeployRequest,
    verbose: bool,
    cancel: CancellationToken,
) -> Result<i32> {
    let config = load_config_for(ctx, request.mode)?;

    let timeout = request
        .timeout
        .map(Duration::from_secs)
        .or_else(|| config.timeout());
    let mut options = DeployOptions::new(request.target)
        .with_mode(request.mode)
        .with_timeout(timeout)
        .with_page_size(config.deploy.page_size);
    if let Some(file) = request.file {
        options = options.with_file(file);
    }

    let api = if request.mode.needs_api() {
        ctx.resource_api(&config)?
    } else {
        None
    };

    let format = request.format;
    let mut observer = |progress: Progress<'_>| {
        if format == OutputFormat::Table {
            print_progress(progress);
        }
    };

    let command = ctx.deploy_command();
    let outcome = command
        .execute(
            &options,
            api.as_ref().map(|api| api as &dyn ResourceApi),
            cancel,
            &mut observer,
        )
        .await;

    match outcome {
        Ok(report) => {
            match format {
                OutputFormat::Table => print_report_table(&report, verbose),
                OutputFormat::Json => print_json(&serde_json::to_value(&report)?)?,
            }
            Ok(if report.is_success() { 0 } else { 1 })
        }
        Err(err) => {
            match format {
                OutputFormat::Table => print_error_table(&err),
                OutputFormat::Json => print_json(&error_json(&err))?,
            }
            Ok(1)
        }
    }
}

fn print_progress(progress: Progress<'_>) {
    let result = progress.result;
    let mark = match result.status {
        DeployStatus::Deployed | DeployStatus::WouldDeploy => style("✓").green(),
        DeployStatus::Failed => style("✗").red(),
        DeployStatus::Cancelled => style("⊘").yellow(),
    };
    println!(
        "[{}/{}] {} {}",
        progress.position, progress.total, mark, result.message
    );
}

fn print_report_table(report: &DeployReport, verbose: bool) {
    if verbose {
        println!("Manifest: {}", report.manifest.display());
        for file in report.files.iter().skip(1) {
            println!("  includes {}", file.display());
        }
    }

    if report.mode == DeployMode::ValidateOnly {
        let counts: Vec<String> = report
            .declared
            .iter()
            .map(|(kind, count)| format!("{} {}(s)", count, kind.label()))
            .collect();
        println!(
            "{} {} is valid ({})",
            style("✓").green(),
            report.manifest.display(),
            counts.join(", ")
        );
        return;
    }

    let summary = report.summary;
    println!();
    let line = format!(
        "Summary: {} successful, {} failed, {} total",
        summary.successful, summary.failed, summary.total
    );
    if summary.is_success() {
        println!("{}", style(line).green());
    } else {
        println!("{}", style(line).red());
    }
}

fn print_error_table(err: &DeployError) {
    match err {
        DeployError::Validation(report) => {
            eprintln!(
                "{} validation failed with {} error(s):",
                style("✗").red(),
                report.len()
            );
            for error in &report.errors {
                eprintln!("  - {}", error);
            }
        }
        other => {
            eprintln!("{} {}", style("error:").red().bold(), error_chain(other));
        }
    }
}

fn error_json(err: &DeployError) -> serde_json::Value {
    match err {
        DeployError::Validation(report) => serde_json::json!({
            "valid": false,
            "errors": report.errors,
        }),
        other => serde_json::json!({
            "error": error_chain(other),
        }),
    }
}

/// Render an error with its sources, `outer: inner: root`.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.ends_with(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
