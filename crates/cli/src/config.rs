//! CLI configuration utilities

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use turnstile_core::{Settings, ValidateConfig};
use turnstile_http::{FileCredentialStore, SessionClient, SessionClientBuilder};

/// Environment variable overriding the data directory
pub const STATE_DIR_ENV: &str = "TURNSTILE_STATE_DIR";

/// Determine data directory with default fallback
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        // Check environment variable first, then fall back to system data dir
        if let Ok(state_dir) = std::env::var(STATE_DIR_ENV) {
            PathBuf::from(state_dir)
        } else {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("turnstile")
        }
    })
}

/// Load settings from the optional file and `TURNSTILE_*` variables
pub fn load_settings(config_file: Option<&Path>) -> Result<Settings> {
    Settings::load(config_file).context("failed to load settings")
}

/// Apply command-line overrides and validate the result again
pub fn apply_overrides(
    mut settings: Settings,
    api_url: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<Settings> {
    if let Some(api_url) = api_url {
        settings.api_url = api_url;
    }
    if let Some(timeout_secs) = timeout_secs {
        settings.timeout_secs = timeout_secs;
    }
    settings.validate().context("invalid command-line override")?;
    Ok(settings)
}

/// Build a session client whose credentials persist under the data dir
pub fn build_client(settings: &Settings, data_dir: &Path) -> Result<SessionClient> {
    let credentials_path = settings.credentials_path_or(data_dir);
    tracing::debug!(path = %credentials_path.display(), "Using file credential store");

    let client = SessionClientBuilder::from_settings(settings)
        .store(Arc::new(FileCredentialStore::new(credentials_path)))
        .build()?;
    Ok(client)
}
