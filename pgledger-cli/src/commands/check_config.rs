//! Print the effective configuration

use anyhow::Result;
use clap::Parser;

use super::ConfigArgs;

#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Load, apply overrides and print as YAML with the password masked.
///
/// Writes nothing but the YAML to stdout, so logging is not initialized.
pub fn run_check_config(args: CheckConfigArgs) -> Result<()> {
    let (config, defaults_used) = args.config.load()?;
    if defaults_used {
        eprintln!(
            "no config found at {}: using defaults",
            args.config.config.display()
        );
    }
    print!("{}", config.masked().to_yaml()?);
    Ok(())
}
