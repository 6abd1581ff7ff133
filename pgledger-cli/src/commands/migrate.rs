//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;

use super::{load_and_init, ConfigArgs};

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Apply pending migrations, failing on any error
pub async fn run_migrate(args: MigrateArgs, debug: bool) -> Result<()> {
    let config = load_and_init(&args.config, debug)?;
    pgledger_server::migrate(&config).await.with_context(|| {
        format!(
            "Failed to migrate database {} with scripts from {}",
            config.postgres_db,
            config.migrations_path.display()
        )
    })
}
