//! `diabuddy-agent` -- headless glucose-to-bulb monitor.
//!
//! Polls the xDrip+ local web service for the latest reading and sets a
//! smart bulb's colour to match its alert band. Notifications are written
//! to the log.
//!
//! # Commands
//!
//! | Command   | Behaviour                                                   |
//! |-----------|-------------------------------------------------------------|
//! | `monitor` | Start monitoring and run until Ctrl-C (default)              |
//! | `check`   | Start monitoring, run one immediate check, stop              |
//! | `test`    | Run the connection test; exit code reflects the result       |
//!
//! Configuration is read from the environment; see
//! [`AgentConfig::from_env`](diabuddy_agent::config::AgentConfig::from_env).

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use diabuddy_agent::config::AgentConfig;
use diabuddy_agent::runner;

#[derive(Parser)]
#[command(name = "diabuddy-agent", about = "Glucose-driven smart bulb monitor")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Override CHECK_INTERVAL_SECS.
    #[arg(long, global = true)]
    interval: Option<u64>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Monitor until interrupted.
    Monitor,
    /// Run a single immediate check.
    Check,
    /// Test the reading source and the bulb.
    Test,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diabuddy_agent=info,diabuddy_monitor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "diabuddy-agent failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = AgentConfig::from_env().context("Failed to load configuration")?;
    if let Some(secs) = cli.interval {
        anyhow::ensure!(secs > 0, "--interval must be positive");
        config.check_interval = std::time::Duration::from_secs(secs);
    }

    let command = cli.command.unwrap_or(Command::Monitor);

    tracing::info!(
        interval_secs = config.check_interval.as_secs(),
        xdrip_urls = ?config.xdrip_urls,
        bulb = %config.credentials.endpoint_address(),
        "Starting diabuddy-agent",
    );

    let controller = runner::build(&config);
    let cancel = CancellationToken::new();
    let logger = tokio::spawn(runner::log_events(
        controller.bus().subscribe(),
        cancel.clone(),
    ));

    let result = match command {
        Command::Monitor => runner::run_monitor(&controller, &config, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
        })
        .await
        .map(|()| ExitCode::SUCCESS)
        .context("Monitoring could not start"),
        Command::Check => runner::run_check(&controller, &config)
            .await
            .map(|outcome| {
                tracing::info!(
                    value = outcome.reading.value(),
                    band = %outcome.band,
                    bulb = ?outcome.bulb,
                    "Check complete",
                );
                ExitCode::SUCCESS
            })
            .context("Check failed"),
        Command::Test => {
            let report = runner::run_test(&controller, &config).await;
            Ok(if report.result.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    };

    cancel.cancel();
    let _ = logger.await;

    result
}
