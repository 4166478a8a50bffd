pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use portfolio_core::config::{ConfigOverrides, LoadOptions, LogFormat};

use commands::actions::ActionsArgs;
use commands::evaluate::EvaluateArgs;
use commands::permissions::PermissionsArgs;
use commands::transition::TransitionArgs;
use commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "portfolio",
    about = "Portfolio approval gate CLI",
    long_about = "Evaluate role capabilities, compute approval transitions, and inspect configuration.",
    after_help = "Examples:\n  portfolio evaluate --permission APPROVE_PROJECT --role sub_pmo --own-item false\n  portfolio transition --state SUBMITTED --role sub_pmo --action APPROVE\n  portfolio doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a portfolio.toml config file")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override logging.level")]
    pub log_level: Option<String>,
    #[arg(long, global = true, help = "Override logging.format (compact|pretty|json)")]
    pub log_format: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Decide whether an actor holds a permission against a resource")]
    Evaluate(EvaluateArgs),
    #[command(about = "Compute the successor approval status for a role and action")]
    Transition(TransitionArgs),
    #[command(about = "List the workflow actions a role may take from a status")]
    Actions(ActionsArgs),
    #[command(about = "List every catalogued permission with the grant a role receives")]
    Permissions(PermissionsArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and replay an approval scenario in memory")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    pub fn load_options(&self) -> Result<LoadOptions, CommandResult> {
        let log_format = match self.log_format.as_deref() {
            Some(raw) => Some(raw.parse::<LogFormat>().map_err(|error| {
                CommandResult::invalid_input(self.command.name(), error.to_string())
            })?),
            None => None,
        };

        Ok(LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                log_level: self.log_level.clone(),
                log_format,
                ..ConfigOverrides::default()
            },
        })
    }
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Evaluate(_) => "evaluate",
            Self::Transition(_) => "transition",
            Self::Actions(_) => "actions",
            Self::Permissions(_) => "permissions",
            Self::Config => "config",
            Self::Doctor { .. } => "doctor",
        }
    }
}

pub fn execute(cli: &Cli, options: &LoadOptions) -> CommandResult {
    match &cli.command {
        Command::Evaluate(args) => commands::evaluate::run(args),
        Command::Transition(args) => commands::transition::run(args),
        Command::Actions(args) => commands::actions::run(args),
        Command::Permissions(args) => commands::permissions::run(args),
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => commands::doctor::run(options, *json),
    }
}
