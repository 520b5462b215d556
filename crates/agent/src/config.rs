//! Agent configuration loaded from environment variables, with an
//! optional JSON settings file as a fallback for the bulb credentials.

use std::path::{Path, PathBuf};
use std::time::Duration;

use diabuddy_core::ConnectionCredentials;
use diabuddy_xdrip::api::{DEFAULT_BASE_URLS, DEFAULT_REQUEST_TIMEOUT};
use serde::Deserialize;

/// Default seconds between polls.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("Failed to read settings file {}: {source}", path.display())]
    SettingsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings file {}: {source}", path.display())]
    SettingsParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Bulb settings as persisted by the desktop app.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub tapo_email: String,
    #[serde(default)]
    pub tapo_password: String,
    #[serde(default)]
    pub tapo_ip: String,
}

impl SettingsFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SettingsRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Runtime configuration for the agent.
///
/// Missing credentials are not a load error: the controller refuses to
/// start and reports it, while `test` still exercises the reading source.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub credentials: ConnectionCredentials,
    pub check_interval: Duration,
    /// Ordered xDrip+ candidate base URLs.
    pub xdrip_urls: Vec<String>,
    pub xdrip_timeout: Duration,
}

impl AgentConfig {
    /// Load configuration from the process environment.
    ///
    /// | Variable              | Required       | Default                                  |
    /// |-----------------------|----------------|------------------------------------------|
    /// | `BULB_HOST`           | for monitoring | settings file `tapo_ip`                  |
    /// | `BULB_USERNAME`       | for monitoring | settings file `tapo_email`               |
    /// | `BULB_PASSWORD`       | for monitoring | settings file `tapo_password`            |
    /// | `CHECK_INTERVAL_SECS` | no             | `100`                                    |
    /// | `XDRIP_URLS`          | no             | loopback `:17580` candidates             |
    /// | `XDRIP_TIMEOUT_SECS`  | no             | `10`                                     |
    /// | `SETTINGS_FILE`       | no             | --                                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let settings = match var("SETTINGS_FILE") {
            Some(path) => SettingsFile::load(Path::new(&path))?,
            None => SettingsFile::default(),
        };

        let credentials = ConnectionCredentials::new(
            var("BULB_HOST").unwrap_or(settings.tapo_ip),
            var("BULB_USERNAME").unwrap_or(settings.tapo_email),
            var("BULB_PASSWORD").unwrap_or(settings.tapo_password),
        );

        let check_interval = Duration::from_secs(parse_secs(
            "CHECK_INTERVAL_SECS",
            var("CHECK_INTERVAL_SECS"),
            DEFAULT_CHECK_INTERVAL_SECS,
        )?);

        let xdrip_timeout = Duration::from_secs(parse_secs(
            "XDRIP_TIMEOUT_SECS",
            var("XDRIP_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        )?);

        let xdrip_urls: Vec<String> = var("XDRIP_URLS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| DEFAULT_BASE_URLS.iter().map(|u| u.to_string()).collect());

        Ok(Self {
            credentials,
            check_interval,
            xdrip_urls,
            xdrip_timeout,
        })
    }
}

fn parse_secs(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidNumber { var, value: raw }),
    }
}
