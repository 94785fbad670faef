//! Startup settings.
//!
//! Read from the environment first, then from a JSON file:
//! - `ADMIN_API_BASE_URL` (required)
//! - `ADMIN_API_SERVICE` (defaults to `admin`)
//! - `ADMIN_API_TIMEOUT_MS` (optional, no deadline when unset)
//! - `ADMIN_API_TOKEN` (optional bearer token)
//!
//! The file path comes from `ADMIN_API_CONFIG`, else `./admin_api.json`.

use dispatch_core::prelude::{ConfigError, SecretString, ServiceConfig};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_BASE_URL: &str = "ADMIN_API_BASE_URL";
pub const ENV_SERVICE: &str = "ADMIN_API_SERVICE";
pub const ENV_TIMEOUT_MS: &str = "ADMIN_API_TIMEOUT_MS";
pub const ENV_TOKEN: &str = "ADMIN_API_TOKEN";
pub const ENV_CONFIG_PATH: &str = "ADMIN_API_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "admin_api.json";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    pub base_url: String,
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    token: Option<String>,
}

fn default_service() -> String {
    "admin".to_string()
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("service", &self.service)
            .field("timeout_ms", &self.timeout_ms)
            .field("token", &self.token.as_ref().map(|_| "<secret>"))
            .finish()
    }
}

impl Settings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service: default_service(),
            timeout_ms: None,
            token: None,
        }
    }

    pub fn token(&self) -> Option<SecretString> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(SecretString::new)
    }

    /// Environment first, file as fallback.
    pub fn load() -> Result<Self, SettingsError> {
        match Self::from_env() {
            Ok(s) => {
                tracing::info!("settings loaded from environment");
                Ok(s)
            }
            Err(e) => {
                tracing::debug!(error = %e, "environment incomplete, trying settings file");
                let path = std::env::var(ENV_CONFIG_PATH)
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
                Self::from_json_file(&path)
            }
        }
    }

    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let base_url = lookup(ENV_BASE_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or(SettingsError::Missing(ENV_BASE_URL))?;
        let service = lookup(ENV_SERVICE)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(default_service);
        let timeout_ms = lookup(ENV_TIMEOUT_MS)
            .map(|v| {
                v.trim().parse::<u64>().map_err(|e| SettingsError::Invalid {
                    name: ENV_TIMEOUT_MS,
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        Ok(Self {
            base_url,
            service,
            timeout_ms,
            token: lookup(ENV_TOKEN),
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SettingsError> {
        tracing::info!(path = %path.display(), "loading settings file");
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// `timeout_ms: 0` means no deadline.
    pub fn to_service_config(&self) -> Result<ServiceConfig, SettingsError> {
        let timeout_ms = self.timeout_ms.filter(|ms| *ms > 0);
        Ok(ServiceConfig::builder(self.service.clone(), self.base_url.clone())
            .timeout_ms(timeout_ms)
            .build()?)
    }
}
