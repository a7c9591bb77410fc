//! chatctl - talk to the chat backend from the command line

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "chatctl")]
#[command(about = "Issue authenticated requests against the chat backend")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Client configuration file (JSON, TOML or YAML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Override the base URL relative paths are resolved against
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Token store file (defaults to CHAT_STATE_DIR/tokens.json)
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    /// Bearer token to send instead of the stored one
    #[arg(long, global = true, env = "CHATCTL_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds, overriding the configuration (0 = no timeout)
    #[arg(short = 't', long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.into())?;

    let client_config = config::load_client_config(
        cli.config.as_deref(),
        cli.base_url,
        cli.timeout,
    )?;
    let token_file = cli.token_file.unwrap_or_else(config::default_token_file);
    debug!(base_url = %client_config.base_url, token_file = %token_file.display(), "Resolved settings");

    match cli
        .command
        .execute(client_config, token_file, cli.token)
        .await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Command failed: {e:#}");
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
