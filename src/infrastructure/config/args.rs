use super::app_config::LogLevel;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "oxilinks",
    version,
    about = "A Discord bot that swaps social media links for embed-friendly mirrors",
    long_about = None
)]
/// Command line arguments. Most flags also read an environment variable.
pub struct CliArgs {
    /// Command to run. Defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", env = "BOT_CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Discord bot token.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true, global = true)]
    pub bot_token: Option<String>,

    /// Address of the health endpoint.
    #[arg(long, value_name = "ADDR", env = "HEALTH_ADDR", global = true)]
    pub health_addr: Option<SocketAddr>,

    /// Don't start the health endpoint.
    #[arg(long, global = true)]
    pub disable_healthcheck: bool,
}

impl CliArgs {
    /// Returns the subcommand, `run` when none was given.
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}

/// Subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Connect to Discord and rewrite links until interrupted.
    Run,
    /// Rewrite the given text offline and print the result.
    Check {
        /// Apply only this transform.
        #[arg(short, long, value_name = "NAME")]
        transform: Option<String>,

        /// Text to rewrite.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List registered transforms in matching order.
    List,
}
