//! AVD Pilot - stdio JSON-RPC server for Android emulator automation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use avd_pilot::core::{AppConfig, APP_NAME};
use avd_pilot::server::Server;
use avd_pilot::{PilotContext, VERSION};

#[derive(Debug, Parser)]
#[command(name = "avd-pilot", version, about = "Android emulator automation over JSON-RPC on stdio")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter, overriding RUST_LOG and the config file (e.g. debug)
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Failed to load configuration")?;

    init_logging(cli.log_level.as_deref(), &config.log_level)?;

    info!("{} v{} starting", APP_NAME, VERSION);
    info!(
        sdk = ?config.android.sdk_path,
        model_server = %config.model.base_url,
        "Configuration loaded"
    );

    let server = Server::new(PilotContext::from_config(&config));
    server.run_stdio().await.context("stdio transport failed")?;

    Ok(())
}

/// Log to stderr; stdout carries the protocol.
fn init_logging(cli_filter: Option<&str>, config_filter: &str) -> Result<()> {
    let filter = match cli_filter {
        Some(filter) => EnvFilter::try_new(filter)?,
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config_filter))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    Ok(())
}
