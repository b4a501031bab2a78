//! Client configuration.
//!
//! The base URL is external configuration: it is used as given, minus any
//! trailing slash.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const BASE_URL_VAR: &str = "PENSION_API_URL";
pub const TIMEOUT_VAR: &str = "PENSION_API_TIMEOUT_SECS";
pub const CREDENTIAL_FILE_VAR: &str = "PENSION_CREDENTIAL_FILE";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    EmptyBaseUrl { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Durable credential file. `None` keeps the token in memory only.
    pub credential_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            credential_path: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_credential_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_path = Some(path.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl { var: BASE_URL_VAR });
        }
        let mut config = Self::new(base_url.trim());

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout {
                    var: TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.credential_path = lookup(CREDENTIAL_FILE_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}
