mod api;
mod cli;
mod config;
mod error;
mod orchestrator;
mod poller;
mod setup;
mod state_machine;
mod ui;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::{ApiClient, MigrationApi};
use cli::{Cli, Command};
use config::{CONFIG_FILE, FlexConfig};
use orchestrator::MigrationRunner;
use poller::{PollOutcome, StatusPoller};
use ui::MigrationProgress;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;

    match cli.command {
        Command::Login => {
            let (username, password) = config
                .credentials()
                .context("login needs username and password (FLEXIFY_USERNAME / FLEXIFY_PASSWORD)")?;
            let client = ApiClient::new(config.api_config())?;
            let token = client
                .authenticate(username, password)
                .await
                .context("authentication failed")?;
            println!("{token}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Providers => {
            let client = connect(&config).await?;
            let providers = client
                .list_providers()
                .await
                .context("failed to list storage providers")?;
            for p in providers {
                println!(
                    "{:>4}  {:<28}  {}",
                    p.id,
                    p.name.as_deref().unwrap_or("-"),
                    p.endpoint.as_deref().unwrap_or("-")
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run => {
            let client = connect(&config).await?;
            let runner = MigrationRunner::new(&client, poller_from(&config)?);
            let id = runner
                .start(&config)
                .await
                .context("failed to start migration")?;
            println!("Migration {id} started");
            watch(&runner, id, cli.json).await
        }
        Command::Watch { id } => {
            let client = connect(&config).await?;
            let runner = MigrationRunner::new(&client, poller_from(&config)?);
            watch(&runner, id, cli.json).await
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "flexmig=debug" } else { "flexmig=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<FlexConfig> {
    let mut config = match cli.config.as_deref() {
        Some(path) => FlexConfig::load_from(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => FlexConfig::load().with_context(|| format!("failed to load {CONFIG_FILE}"))?,
    };
    apply_cli_overrides(&mut config, cli);
    Ok(config)
}

/// Flags da CLI têm precedência sobre arquivo e ambiente.
fn apply_cli_overrides(config: &mut FlexConfig, cli: &Cli) {
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(ms) = cli.interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(max) = cli.max_failures {
        config.max_consecutive_failures = max;
    }
    if cli.keep_polling_without_engine {
        config.no_connection_is_terminal = false;
    }
}

fn poller_from(config: &FlexConfig) -> Result<StatusPoller> {
    Ok(StatusPoller::new(
        config.poller_config()?,
        config.classifier(),
    ))
}

/// Build the client, logging in first when only credentials are configured.
async fn connect(config: &FlexConfig) -> Result<ApiClient> {
    let client = ApiClient::new(config.api_config())?;
    if client.config().token.is_some() {
        return Ok(client);
    }
    match config.credentials() {
        Some((username, password)) => {
            let token = client
                .authenticate(username, password)
                .await
                .context("authentication failed")?;
            info!(username, "authenticated");
            Ok(client.with_token(token))
        }
        None => {
            warn!("no API key or credentials configured; requests are unauthenticated");
            Ok(client)
        }
    }
}

async fn watch<A: MigrationApi>(
    runner: &MigrationRunner<'_, A>,
    id: i64,
    json: bool,
) -> Result<ExitCode> {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let mut progress = MigrationProgress::start(id);
    let outcome = match runner.watch(id, &mut progress, &cancel).await {
        Ok(outcome) => outcome,
        Err(e) => {
            progress.abandon();
            return Err(e).with_context(|| format!("lost track of migration {id}"));
        }
    };
    progress.complete(&outcome);

    match outcome {
        PollOutcome::Finished(summary) => {
            if json {
                ui::print_summary(&summary);
            }
            if summary.final_status.is_clean_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        PollOutcome::Cancelled { .. } => Ok(ExitCode::FAILURE),
    }
}
