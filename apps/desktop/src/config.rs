use std::{collections::HashMap, fs, io, path::Path, time::Duration};

use client_core::{transport::DEFAULT_BASE_URL, ServiceConfig};
use serde::Deserialize;
use shared::domain::Endpoint;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "helpdesk.toml";
const DEFAULT_TIMEOUT_SECS: u64 = 45;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown endpoint '{0}' in config; expected rag, duo or ai")]
    UnknownEndpoint(String),
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid base url '{raw}': {source}")]
    InvalidBaseUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    strict_decoding: Option<bool>,
    endpoints: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub strict_decoding: bool,
    pub endpoint_paths: HashMap<Endpoint, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            strict_decoding: false,
            endpoint_paths: Endpoint::ALL
                .into_iter()
                .map(|endpoint| (endpoint, endpoint.default_path().to_string()))
                .collect(),
        }
    }
}

impl Settings {
    /// Overlays values from a TOML document.
    pub fn apply_toml(&mut self, raw: &str, path: &str) -> Result<(), ConfigError> {
        let file_cfg: FileSettings = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;

        if let Some(v) = file_cfg.base_url {
            self.base_url = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file_cfg.strict_decoding {
            self.strict_decoding = v;
        }
        for (name, route) in file_cfg.endpoints {
            let endpoint =
                Endpoint::parse(&name).ok_or_else(|| ConfigError::UnknownEndpoint(name.clone()))?;
            self.endpoint_paths.insert(endpoint, route);
        }
        Ok(())
    }

    /// Overlays `APP__*` variables resolved through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("APP__BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs =
                v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "APP__REQUEST_TIMEOUT_SECS",
                    value: v.clone(),
                })?;
        }
        if let Some(v) = lookup("APP__STRICT_DECODING") {
            self.strict_decoding = parse_flag(&v).ok_or(ConfigError::InvalidValue {
                key: "APP__STRICT_DECODING",
                value: v.clone(),
            })?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn service_config(&self) -> Result<ServiceConfig, ConfigError> {
        let raw = self.base_url.trim();
        let base_url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl {
            raw: raw.to_string(),
            source,
        })?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                value: "0".into(),
            });
        }

        let mut config = ServiceConfig::new(base_url);
        config.paths = self.endpoint_paths.clone();
        config.request_timeout = self.request_timeout();
        config.strict_decoding = self.strict_decoding;
        Ok(config)
    }
}

/// Defaults, then the config file when present, then the process environment.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();
    let display = path.display().to_string();

    match fs::read_to_string(path) {
        Ok(raw) => settings.apply_toml(&raw, &display)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ConfigError::Read {
                path: display,
                source,
            })
        }
    }

    settings.apply_env(|key| std::env::var(key).ok())?;
    Ok(settings)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
