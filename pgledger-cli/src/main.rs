//! pgledger CLI - accounts and transfers over PostgreSQL
//!
//! Entry point for the `pgledger` binary:
//! - `serve`: run the HTTP service
//! - `migrate`: apply schema migrations
//! - `check-config`: print the effective configuration

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "pgledger",
    author,
    version,
    about = "Ledger service for accounts and transfers backed by PostgreSQL"
)]
struct Cli {
    /// Enable debug logging (not for production)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Apply database migrations and exit
    Migrate(commands::migrate::MigrateArgs),
    /// Print the effective configuration with secrets masked
    CheckConfig(commands::check_config::CheckConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Optional; env vars may also come from the environment directly
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, cli.debug).await?,
        Commands::Migrate(args) => commands::run_migrate(args, cli.debug).await?,
        Commands::CheckConfig(args) => commands::run_check_config(args)?,
    }
    Ok(())
}
