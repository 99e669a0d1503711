//! Configuration structures.
//!
//! Configuration is built from defaults and optionally overlaid with
//! environment variables via [`Config::from_env`].

use serde::{Deserialize, Serialize};

use super::{Error, Result};

/// Environment variable overriding [`ReadConfig::max_body_bytes`].
pub const ENV_MAX_BODY_BYTES: &str = "JSON_BODY_MAX_BYTES";
/// Environment variable overriding [`ObservabilityConfig::log_level`].
pub const ENV_LOG_LEVEL: &str = "JSON_BODY_LOG_LEVEL";
/// Environment variable switching log output to JSON when set to `json`.
pub const ENV_LOG_FORMAT: &str = "JSON_BODY_LOG_FORMAT";

/// Global configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Body reading configuration.
    #[serde(default)]
    pub read: ReadConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Defaults overlaid with any `JSON_BODY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_MAX_BODY_BYTES) {
            config.read.max_body_bytes = raw.trim().parse().map_err(|_| {
                Error::config(format!(
                    "{ENV_MAX_BODY_BYTES} must be a byte count, got {raw:?}"
                ))
            })?;
        }
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            config.observability.log_level = level;
        }
        if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
            config.observability.json_logs = format.eq_ignore_ascii_case("json");
        }

        Ok(config)
    }
}

/// Body reading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    /// Maximum accepted body size in bytes. Larger bodies are rejected
    /// before any decoding happens.
    pub max_body_bytes: usize,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
