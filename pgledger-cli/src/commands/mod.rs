//! Command implementations for the pgledger CLI

pub mod check_config;
pub mod migrate;
pub mod serve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pgledger_server::Config;

use crate::tracing_setup::{self, TracingConfig};

pub use check_config::run_check_config;
pub use migrate::run_migrate;
pub use serve::run_serve;

/// Config file selection shared by every command
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the YAML configuration file
    #[arg(long, short = 'c', env = "PGLEDGER_CONFIG", default_value = "config.yml")]
    pub config: PathBuf,
}

impl ConfigArgs {
    /// Load the config file, falling back to defaults when it is absent.
    pub fn load(&self) -> Result<(Config, bool)> {
        Config::load(&self.config)
            .with_context(|| format!("Failed to load config from {}", self.config.display()))
    }
}

/// Load config and start logging; warns once logging is up if defaults were used.
fn load_and_init(args: &ConfigArgs, debug: bool) -> Result<Config> {
    let (config, defaults_used) = args.load()?;
    tracing_setup::init(&TracingConfig::from_config(&config, debug))?;
    if defaults_used {
        tracing::warn!(path = %args.config.display(), "no config supplied: using default");
    }
    Ok(config)
}
