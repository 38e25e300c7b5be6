//! Turnstile CLI - authenticated sessions against a REST API

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "turnstile")]
#[command(about = "Log in, call the API with a refreshing session, and serve a gated site")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Data directory for credentials and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file (toml, yaml or json)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Remote API base URL, overriding settings
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Transport timeout in seconds, overriding settings
    #[arg(short = 't', long, global = true)]
    timeout: Option<u64>,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = config::resolve_data_dir(cli.data_dir);
    let component = match &cli.command {
        Commands::Serve { .. } => "serve",
        _ => "cli",
    };
    logging::init_logging(cli.log_level.into(), &data_dir, component, cli.no_file_log)?;

    let settings = config::load_settings(cli.config.as_deref())?;
    let settings = config::apply_overrides(settings, cli.api_url, cli.timeout)?;

    info!(api_url = %settings.api_url, data_dir = %data_dir.display(), "Starting Turnstile CLI");

    match cli.command.execute(settings, data_dir).await {
        Ok(()) => {
            info!("Command completed successfully");
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
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
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
