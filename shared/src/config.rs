use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::capabilities::AllowedHosts;
use crate::DEFAULT_TOAST_DURATION_MS;

pub const ENV_PREFIX: &str = "REVUP_";

fn def_api_base_url() -> String {
    String::from("https://admin-bot-develop.revup.trio-tech.online")
}

fn def_image_hosts() -> Vec<String> {
    vec![String::from("s3.cdn.lego-car.ru")]
}

fn def_toast_duration_ms() -> u64 {
    DEFAULT_TOAST_DURATION_MS
}

fn def_catalog_page_size() -> u32 {
    10
}

fn def_storage_path() -> String {
    String::from("revup-storage.json")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(String),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Origin of the listing API, without the `/api` path.
    #[serde(default = "def_api_base_url")]
    pub api_base_url: String,

    /// Hosts remote photos may be rendered from. `*.example.com` matches subdomains.
    #[serde(default = "def_image_hosts")]
    pub image_hosts: Vec<String>,

    #[serde(default = "def_toast_duration_ms")]
    pub toast_duration_ms: u64,

    #[serde(default = "def_catalog_page_size")]
    pub catalog_page_size: u32,

    /// Shell only: file backing the key/value store.
    #[serde(default = "def_storage_path")]
    pub storage_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: def_api_base_url(),
            image_hosts: def_image_hosts(),
            toast_duration_ms: def_toast_duration_ms(),
            catalog_page_size: def_catalog_page_size(),
            storage_path: def_storage_path(),
        }
    }
}

impl AppConfig {
    /// Loads `REVUP_*` variables from the process environment and validates them.
    #[cfg(feature = "shell")]
    pub fn from_env() -> Result<AppConfig, ConfigError> {
        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<AppConfig>()
            .map_err(|e| ConfigError::Env(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Same as [`AppConfig::from_env`] over an explicit set of variables.
    #[cfg(feature = "shell")]
    pub fn from_vars<I>(vars: I) -> Result<AppConfig, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::prefixed(ENV_PREFIX)
            .from_iter::<_, AppConfig>(vars)
            .map_err(|e| ConfigError::Env(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api_base_url).map_err(|e| ConfigError::Invalid {
            field: "api_base_url",
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::Invalid {
                field: "api_base_url",
                reason: "must be an http(s) URL with a host".to_string(),
            });
        }

        if self.toast_duration_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "toast_duration_ms",
                reason: "must be positive".to_string(),
            });
        }

        if self.catalog_page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "catalog_page_size",
                reason: "must be positive".to_string(),
            });
        }

        if self.allowed_image_hosts().is_empty() {
            return Err(ConfigError::Invalid {
                field: "image_hosts",
                reason: "at least one host is required".to_string(),
            });
        }

        Ok(())
    }

    pub fn allowed_image_hosts(&self) -> AllowedHosts {
        AllowedHosts::new(&self.image_hosts)
    }
}
