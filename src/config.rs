//! Service configuration file support.
//!
//! Configuration is read from a TOML file and then overridden by a few
//! environment variables:
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! body_limit_bytes = 10485760
//!
//! [forecast]
//! interval_width = 0.8
//! request_timeout_secs = 60
//! max_periods = 10000
//! ```
//!
//! Every field is optional. A missing file means all defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "FORECAST_CONFIG";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Service configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub forecast: ForecastSettings,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

/// Forecast execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSettings {
    /// Coverage of the prediction interval, in (0, 1)
    #[serde(default = "default_interval_width")]
    pub interval_width: f64,
    /// Wall-clock limit for one forecast request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Largest accepted horizon
    #[serde(default = "default_max_periods")]
    pub max_periods: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_interval_width() -> f64 {
    crate::services::DEFAULT_INTERVAL_WIDTH
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_periods() -> usize {
    10_000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            interval_width: default_interval_width(),
            request_timeout_secs: default_request_timeout_secs(),
            max_periods: default_max_periods(),
        }
    }
}

impl ForecastSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ServiceConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Locate the configuration file.
    ///
    /// Searches in order:
    /// 1. `$FORECAST_CONFIG` (must exist when set)
    /// 2. `./forecast.toml`
    /// 3. `./config/forecast.toml`
    pub fn locate() -> Result<Option<PathBuf>, ConfigError> {
        if let Ok(explicit) = env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(explicit);
            if !path.exists() {
                return Err(ConfigError::invalid(
                    CONFIG_PATH_ENV,
                    format!("{} does not exist", path.display()),
                ));
            }
            return Ok(Some(path));
        }

        let search_paths = [
            PathBuf::from("forecast.toml"),
            PathBuf::from("config/forecast.toml"),
        ];
        Ok(search_paths.into_iter().find(|path| path.exists()))
    }

    /// Load from the default location, then apply environment overrides.
    ///
    /// # Environment Variables
    ///
    /// - `HOST`: listener host
    /// - `PORT`: listener port
    /// - `FORECAST_TIMEOUT_SECS`: per-request timeout in seconds
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::locate()? {
            Some(path) => {
                log::debug!("loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override file values with `HOST`, `PORT` and `FORECAST_TIMEOUT_SECS`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_env::<u16>("PORT")? {
            self.server.port = port;
        }
        if let Some(secs) = parse_env::<u64>("FORECAST_TIMEOUT_SECS")? {
            self.forecast.request_timeout_secs = secs;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::invalid("server.host", "must not be empty"));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(ConfigError::invalid(
                "server.body_limit_bytes",
                "must be positive",
            ));
        }

        let width = self.forecast.interval_width;
        if !(width.is_finite() && width > 0.0 && width < 1.0) {
            return Err(ConfigError::invalid(
                "forecast.interval_width",
                format!("must be in (0, 1), got {}", width),
            ));
        }
        if self.forecast.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "forecast.request_timeout_secs",
                "must be positive",
            ));
        }
        if self.forecast.max_periods == 0 {
            return Err(ConfigError::invalid("forecast.max_periods", "must be positive"));
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{}'", raw))),
        Err(_) => Ok(None),
    }
}
