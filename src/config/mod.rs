//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `COMMITTEE_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_SWEEP_INTERVAL_SECS};
use crate::pipeline::DEFAULT_SCORER_TIMEOUT_SECS;
use crate::qc::QcThresholds;
use crate::scorer::DEFAULT_MAX_OUTPUT_TOKENS;
use crate::telemetry::DEFAULT_RECORDER_CAPACITY;

/// Backend list used when `COMMITTEE_BACKENDS` is not set.
pub const DEFAULT_BACKENDS: &str = "openai=https://api.openai.com/v1";

/// One chat-completions endpoint, addressed by provider name.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub name: String,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `COMMITTEE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Scoring backends. Default: OpenAI.
    pub backends: Vec<BackendConfig>,

    /// Upper bound on one scorer call. Default: 45 s.
    pub scorer_timeout: Duration,

    /// `max_tokens` sent to backends. Default: `2000`.
    pub max_output_tokens: u32,

    /// JSON pricing table (`model -> {input_per_1k, output_per_1k}`).
    pub pricing_path: Option<PathBuf>,

    /// JSON array of rubrics served when a request omits its rubric.
    pub rubrics_path: Option<PathBuf>,

    /// Measurements kept by the performance recorder. Default: `10_000`.
    pub recorder_capacity: usize,

    /// Maximum entries in the result cache. Default: `10_000`.
    pub cache_capacity: u64,

    /// Interval of the background cache sweep. Default: 300 s.
    pub cache_sweep_interval: Duration,

    pub qc_thresholds: QcThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            backends: vec![BackendConfig {
                name: "openai".to_string(),
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: None,
            }],
            scorer_timeout: Duration::from_secs(DEFAULT_SCORER_TIMEOUT_SECS),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            pricing_path: None,
            rubrics_path: None,
            recorder_capacity: DEFAULT_RECORDER_CAPACITY,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            qc_thresholds: QcThresholds::default(),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "COMMITTEE_PORT";
    const ENV_BIND_ADDR: &'static str = "COMMITTEE_BIND_ADDR";
    const ENV_BACKENDS: &'static str = "COMMITTEE_BACKENDS";
    const ENV_API_KEY_PREFIX: &'static str = "COMMITTEE_API_KEY_";
    const ENV_SCORER_TIMEOUT_SECS: &'static str = "COMMITTEE_SCORER_TIMEOUT_SECS";
    const ENV_MAX_OUTPUT_TOKENS: &'static str = "COMMITTEE_MAX_OUTPUT_TOKENS";
    const ENV_PRICING_PATH: &'static str = "COMMITTEE_PRICING_PATH";
    const ENV_RUBRICS_PATH: &'static str = "COMMITTEE_RUBRICS_PATH";
    const ENV_RECORDER_CAPACITY: &'static str = "COMMITTEE_RECORDER_CAPACITY";
    const ENV_CACHE_CAPACITY: &'static str = "COMMITTEE_CACHE_CAPACITY";
    const ENV_CACHE_SWEEP_SECS: &'static str = "COMMITTEE_CACHE_SWEEP_SECS";
    const ENV_HIGH_DISAGREEMENT: &'static str = "COMMITTEE_HIGH_DISAGREEMENT";
    const ENV_UNANIMOUS_BELOW: &'static str = "COMMITTEE_UNANIMOUS_BELOW";
    const ENV_SLOW_PROCESSING_MS: &'static str = "COMMITTEE_SLOW_PROCESSING_MS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let backends_raw =
            env::var(Self::ENV_BACKENDS).unwrap_or_else(|_| DEFAULT_BACKENDS.to_string());
        let backends = Self::parse_backends(&backends_raw)?;
        let scorer_timeout = Duration::from_secs(Self::parse_u64_from_env(
            Self::ENV_SCORER_TIMEOUT_SECS,
            defaults.scorer_timeout.as_secs(),
        ));
        let max_output_tokens = Self::parse_u64_from_env(
            Self::ENV_MAX_OUTPUT_TOKENS,
            u64::from(defaults.max_output_tokens),
        )
        .try_into()
        .unwrap_or(defaults.max_output_tokens);
        let pricing_path = Self::parse_optional_path_from_env(Self::ENV_PRICING_PATH);
        let rubrics_path = Self::parse_optional_path_from_env(Self::ENV_RUBRICS_PATH);
        let recorder_capacity = Self::parse_u64_from_env(
            Self::ENV_RECORDER_CAPACITY,
            defaults.recorder_capacity as u64,
        ) as usize;
        let cache_capacity =
            Self::parse_u64_from_env(Self::ENV_CACHE_CAPACITY, defaults.cache_capacity);
        let cache_sweep_interval = Duration::from_secs(Self::parse_u64_from_env(
            Self::ENV_CACHE_SWEEP_SECS,
            defaults.cache_sweep_interval.as_secs(),
        ));
        let qc_thresholds = QcThresholds {
            high_disagreement: Self::parse_f64_from_env(
                Self::ENV_HIGH_DISAGREEMENT,
                defaults.qc_thresholds.high_disagreement,
            ),
            unanimous_below: Self::parse_f64_from_env(
                Self::ENV_UNANIMOUS_BELOW,
                defaults.qc_thresholds.unanimous_below,
            ),
            slow_processing_ms: Self::parse_u64_from_env(
                Self::ENV_SLOW_PROCESSING_MS,
                defaults.qc_thresholds.slow_processing_ms,
            ),
        };

        Ok(Self {
            port,
            bind_addr,
            backends,
            scorer_timeout,
            max_output_tokens,
            pricing_path,
            rubrics_path,
            recorder_capacity,
            cache_capacity,
            cache_sweep_interval,
            qc_thresholds,
        })
    }

    /// Validates ranges and referenced files (does not read them).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backends.is_empty() {
            return Err(ConfigError::NoBackends);
        }

        if self.scorer_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_SCORER_TIMEOUT_SECS,
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.max_output_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_MAX_OUTPUT_TOKENS,
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.recorder_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_RECORDER_CAPACITY,
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_CACHE_CAPACITY,
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.cache_sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_CACHE_SWEEP_SECS,
                reason: "must be greater than 0".to_string(),
            });
        }

        for (name, value) in [
            (
                Self::ENV_HIGH_DISAGREEMENT,
                self.qc_thresholds.high_disagreement,
            ),
            (Self::ENV_UNANIMOUS_BELOW, self.qc_thresholds.unanimous_below),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    name,
                    reason: format!("expected a non-negative number, got {}", value),
                });
            }
        }

        for path in [&self.pricing_path, &self.rubrics_path].into_iter().flatten() {
            Self::validate_file(path)?;
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Parses `name=url[,name=url...]`, attaching `COMMITTEE_API_KEY_<NAME>` keys.
    pub fn parse_backends(raw: &str) -> Result<Vec<BackendConfig>, ConfigError> {
        let mut backends: Vec<BackendConfig> = Vec::new();

        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let invalid = |reason: &str| ConfigError::InvalidBackend {
                entry: entry.to_string(),
                reason: reason.to_string(),
            };

            let (name, url) = entry
                .split_once('=')
                .ok_or_else(|| invalid("expected name=url"))?;
            let name = name.trim();
            let url = url.trim().trim_end_matches('/');

            if name.is_empty() {
                return Err(invalid("backend name is empty"));
            }
            let parsed = reqwest::Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(invalid("url must use http or https"));
            }
            if backends.iter().any(|b| b.name == name) {
                return Err(invalid("duplicate backend name"));
            }

            backends.push(BackendConfig {
                name: name.to_string(),
                base_url: url.to_string(),
                api_key: Self::api_key_for(name),
            });
        }

        if backends.is_empty() {
            return Err(ConfigError::NoBackends);
        }
        Ok(backends)
    }

    /// Environment variable holding the API key of backend `name`.
    pub fn api_key_var(name: &str) -> String {
        let suffix: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", Self::ENV_API_KEY_PREFIX, suffix)
    }

    fn api_key_for(name: &str) -> Option<String> {
        env::var(Self::api_key_var(name))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn validate_file(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(ConfigError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn parse_f64_from_env(var_name: &str, default: f64) -> f64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}
