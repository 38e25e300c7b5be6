//! Layered settings: defaults, optional file, then `TURNSTILE_*` environment

use crate::validation::{ValidateConfig, validators};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `TURNSTILE_API_URL`
pub const ENV_PREFIX: &str = "TURNSTILE";

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
pub const DEFAULT_EXPIRED_MESSAGE: &str = "jwt expired";
pub const DEFAULT_MISSING_MESSAGE: &str = "jwt must be provided";

/// Settings shared by the session client and the route gate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Base URL of the remote REST API
    pub api_url: String,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Where the file credential store lives; defaults under the data dir
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,

    /// Server error text meaning the bearer credential has expired
    #[serde(default = "default_expired_message")]
    pub expired_message: String,

    /// Server error text meaning the bearer credential was not sent
    #[serde(default = "default_missing_message")]
    pub missing_message: String,

    /// Where the route gate sends anonymous navigations
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Paths that are reachable without a session
    #[serde(default = "default_auth_paths")]
    pub auth_paths: Vec<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_expired_message() -> String {
    DEFAULT_EXPIRED_MESSAGE.to_string()
}

fn default_missing_message() -> String {
    DEFAULT_MISSING_MESSAGE.to_string()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_auth_paths() -> Vec<String> {
    vec!["/login".to_string(), "/reset-password".to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: default_timeout_secs(),
            credentials_path: None,
            expired_message: default_expired_message(),
            missing_message: default_missing_message(),
            login_path: default_login_path(),
            auth_paths: default_auth_paths(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file and the environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("timeout_secs", default_timeout_secs())?
            .set_default("expired_message", DEFAULT_EXPIRED_MESSAGE)?
            .set_default("missing_message", DEFAULT_MISSING_MESSAGE)?
            .set_default("login_path", DEFAULT_LOGIN_PATH)?
            .set_default("auth_paths", default_auth_paths())?;

        if let Some(path) = config_file {
            if path.exists() {
                builder = builder.add_source(File::from(path));
            } else {
                return Err(ConfigError::Message(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("auth_paths"),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Credential file location, falling back to `<data_dir>/credentials.json`
    pub fn credentials_path_or(&self, data_dir: &Path) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| data_dir.join("credentials.json"))
    }
}

impl ValidateConfig for Settings {
    fn validate(&self) -> Result<(), ConfigError> {
        validators::validate_http_url(&self.api_url, "api_url")?;
        validators::validate_range(self.timeout_secs, 1, 600, "timeout_secs")?;
        validators::validate_not_empty(&self.expired_message, "expired_message")?;
        validators::validate_not_empty(&self.missing_message, "missing_message")?;
        validators::validate_path(&self.login_path, "login_path")?;
        for path in &self.auth_paths {
            validators::validate_path(path, "auth_paths")?;
        }
        Ok(())
    }
}
