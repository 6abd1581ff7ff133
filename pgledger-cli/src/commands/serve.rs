//! HTTP server command
//!
//! Builds the configured backend and serves the ledger until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;

use super::{load_and_init, ConfigArgs};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Port to listen on (overrides the config file)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, debug: bool) -> Result<()> {
    let mut config = load_and_init(&args.config, debug)?;
    if let Some(port) = args.port {
        config.port = port;
    }

    tracing::info!(
        backend = %config.backend,
        clients = config.max_threads,
        "starting pgledger"
    );

    // Blocks until shutdown
    pgledger_server::run(config).await.context("Server error")?;

    Ok(())
}
