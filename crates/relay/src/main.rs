//! Graphite Relay
//!
//! # Usage
//!
//! ```bash
//! graphite-relay --config relay.toml --clusters clusters.toml --rules rules.toml
//! graphite-relay --config relay.toml --clusters clusters.toml --rules rules.toml \
//!     --rewrites rewrites.toml --log-level debug
//!
//! # Check the configuration and exit
//! graphite-relay --config relay.toml --clusters clusters.toml --rules rules.toml --validate
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use graphite_relay::{Configs, Relay};
use relay_config::LogFormat;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Graphite line-protocol relay
#[derive(Parser, Debug)]
#[command(name = "graphite-relay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Main configuration file
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: PathBuf,

    /// Clusters file
    #[arg(long, env = "RELAY_CLUSTERS")]
    clusters: PathBuf,

    /// Rules file
    #[arg(long, env = "RELAY_RULES")]
    rules: PathBuf,

    /// Rewrites file (optional)
    #[arg(long, env = "RELAY_REWRITES")]
    rewrites: Option<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    validate: bool,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let configs = Configs::load(&cli.config, &cli.clusters, &cli.rules, cli.rewrites.as_deref())?;

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(configs.main.log.level.as_str());
    init_logging(level, configs.main.log.format)?;

    if cli.validate {
        configs.check()?;
        println!(
            "configuration OK: {} clusters, {} rules, {} rewrites",
            configs.clusters.clusters.len(),
            configs.rules.rules.len(),
            configs.rewrites.rewrites.len()
        );
        return Ok(());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %cli.config.display(),
        clusters = %cli.clusters.display(),
        rules = %cli.rules.display(),
        "relay starting"
    );

    let relay = match Relay::start(configs).await {
        Ok(relay) => relay,
        Err(e) => {
            error!(error = ?e, "startup failed");
            return Err(e);
        }
    };

    wait_for_shutdown().await;
    info!("shutdown signal received");

    relay.shutdown().await
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Console => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
    }

    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
