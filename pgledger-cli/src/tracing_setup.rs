//! Tracing setup for the pgledger CLI
//!
//! Usage:
//!   pgledger --debug serve            # Debug logging regardless of config
//!   RUST_LOG=pgledger=trace pgledger  # Fine-grained log control
//!
//! The configured `loglevel` applies unless `RUST_LOG` is set. With
//! `logtofile` enabled, plain-text output is also appended to `pgledger.log`.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use pgledger_server::{Config, LogFormat, LogLevel};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// File that receives log output when `logtofile` is set
pub const LOG_FILE: &str = "pgledger.log";

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Force debug level (overrides the configured level)
    pub debug: bool,
    pub level: LogLevel,
    pub format: LogFormat,
    pub to_file: bool,
}

impl TracingConfig {
    pub fn from_config(config: &Config, debug: bool) -> Self {
        Self {
            debug,
            level: config.loglevel,
            format: config.logformat,
            to_file: config.logtofile,
        }
    }

    fn effective_level(&self) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else {
            self.level
        }
    }
}

/// Initialize tracing based on configuration
pub fn init(config: &TracingConfig) -> Result<()> {
    let level = config.effective_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let json = config.format == LogFormat::Json;
    let plain_layer = (!json).then(|| fmt::layer().with_target(config.debug).compact());
    let json_layer = json.then(|| fmt::layer().json().with_target(true));

    let file_layer = if config.to_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_FILE)
            .with_context(|| format!("Failed to open log file {LOG_FILE}"))?;
        Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    if matches!(level, LogLevel::Debug | LogLevel::Trace) {
        tracing::warn!("debug logging is enabled; do not run this mode in production");
    }
    Ok(())
}
