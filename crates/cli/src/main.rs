use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Parser;
use portfolio_cli::{execute, Cli};
use portfolio_core::config::{AppConfig, LoggingConfig};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    use portfolio_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let result = match logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
    result.map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let options = match cli.load_options() {
        Ok(options) => options,
        Err(result) => {
            println!("{}", result.output);
            return Ok(ExitCode::from(result.exit_code));
        }
    };

    // Commands report configuration errors themselves; logging falls back to defaults.
    let logging = AppConfig::load(options.clone())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    init_logging(&logging)?;

    tracing::debug!(
        event_name = "system.cli.command_started",
        command = cli.command.name(),
        "running command"
    );

    let result = execute(&cli, &options);
    println!("{}", result.output);
    Ok(ExitCode::from(result.exit_code))
}
