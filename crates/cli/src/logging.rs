use anyhow::Result;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use turnstile_core::tracing::{InstrumentationConfig, init_tracing};

/// Initialize logging for the CLI
pub fn init_logging(
    log_level: Level,
    data_dir: &Path,
    component: &str,
    no_file_log: bool,
) -> Result<()> {
    if no_file_log {
        // Only log to stderr, honouring TURNSTILE_LOG_JSON
        let config = InstrumentationConfig {
            service_name: format!("turnstile-{component}"),
            log_level: default_filter(log_level),
            ..InstrumentationConfig::from_env()
        };
        init_tracing(&config)
    } else {
        init_file_logging(log_level, data_dir, component)
    }
}

fn default_filter(level: Level) -> String {
    let level_str = level.as_str().to_lowercase();
    format!("turnstile={level_str},turnstile_core={level_str},turnstile_http={level_str}")
}

fn init_file_logging(level: Level, data_dir: &Path, component: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());

    let log_file_path = get_log_file_path(data_dir, component);
    if let Some(parent) = log_file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .try_init()?;

    Ok(())
}

fn get_log_file_path(data_dir: &Path, component: &str) -> PathBuf {
    data_dir.join("logs").join(format!("{component}.log"))
}
