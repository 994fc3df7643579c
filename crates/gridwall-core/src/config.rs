//! Configuration loading and typed config structures for the Gridwall server.
//!
//! The canonical configuration lives in `gridwall-config.yaml` at the project
//! root. Every field has a default, so a missing file yields a runnable
//! configuration. After parsing, environment variables override individual
//! values and the result is validated once; the configuration is immutable
//! for the rest of the process lifetime.

use std::path::Path;

use gridwall_types::RateMode;
use serde::Deserialize;

use crate::rate_limit::RatePolicy;

/// Largest accepted grid side length (a million cells).
pub const MAX_GRID_SIZE: usize = 1000;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range or malformed.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
///
/// Mirrors the structure of `gridwall-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GridwallConfig {
    /// Grid dimensions.
    #[serde(default)]
    pub grid: GridConfig,

    /// Rate-limit policy.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Listener address.
    #[serde(default)]
    pub listen: ListenConfig,

    /// Broadcast fan-out tuning.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GridwallConfig {
    /// Load configuration from a YAML file, applying environment overrides.
    ///
    /// A file that does not exist is not an error: the defaults are used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override or the final values are
    /// out of range.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_yml::from_str(&contents)?
        } else {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// Environment variables are not consulted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Override values from a key lookup (normally the process environment).
    ///
    /// Recognised keys: `GRID_SIZE`, `RATE_MODE`, `RATE_WINDOW_SECONDS`,
    /// `HOST`, `PORT`, `LOG_LEVEL`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a present value does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("GRID_SIZE") {
            self.grid.size = parse_override("GRID_SIZE", &val)?;
        }
        if let Some(val) = lookup("RATE_MODE") {
            self.rate_limit.mode = val.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("RATE_MODE: {e}"),
            })?;
        }
        if let Some(val) = lookup("RATE_WINDOW_SECONDS") {
            self.rate_limit.window_seconds = parse_override("RATE_WINDOW_SECONDS", &val)?;
        }
        if let Some(val) = lookup("HOST") {
            self.listen.host = val;
        }
        if let Some(val) = lookup("PORT") {
            self.listen.port = parse_override("PORT", &val)?;
        }
        if let Some(val) = lookup("LOG_LEVEL") {
            self.logging.level = val;
        }
        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.size == 0 || self.grid.size > MAX_GRID_SIZE {
            return Err(ConfigError::Invalid {
                reason: format!("grid.size must be in 1..={MAX_GRID_SIZE}, got {}", self.grid.size),
            });
        }
        if self.rate_limit.mode == RateMode::Cooldown && self.rate_limit.window_seconds == 0 {
            return Err(ConfigError::Invalid {
                reason: "rate_limit.window_seconds must be at least 1 in cooldown mode".to_owned(),
            });
        }
        if self.broadcast.capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "broadcast.capacity must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    /// Number of cells, `grid.size` squared.
    pub const fn total_cells(&self) -> usize {
        self.grid.total_cells()
    }

    /// The rate-limit policy described by this configuration.
    pub const fn rate_policy(&self) -> RatePolicy {
        match self.rate_limit.mode {
            RateMode::Cooldown => RatePolicy::cooldown_seconds(self.rate_limit.window_seconds),
            RateMode::SingleShot => RatePolicy::SingleShot,
        }
    }
}

/// Grid dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// Side length of the square grid (`GRID_SIZE`).
    #[serde(default = "default_grid_size")]
    pub size: usize,
}

impl GridConfig {
    /// Number of cells, `size` squared. Saturates on overflow, which
    /// [`GridwallConfig::validate`] rules out.
    pub const fn total_cells(&self) -> usize {
        self.size.saturating_mul(self.size)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: default_grid_size(),
        }
    }
}

/// Rate-limit policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateLimitConfig {
    /// `cooldown` or `single_shot` (`RATE_MODE`).
    #[serde(default)]
    pub mode: RateMode,

    /// Cooldown window in seconds (`RATE_WINDOW_SECONDS`). Ignored in
    /// single-shot mode.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            mode: RateMode::default(),
            window_seconds: default_window_seconds(),
        }
    }
}

/// Listener address for the HTTP and `WebSocket` server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Broadcast fan-out tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastConfig {
    /// Events buffered per subscriber before it is considered lagged.
    #[serde(default = "default_broadcast_capacity")]
    pub capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            capacity: default_broadcast_capacity(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn parse_override<T: core::str::FromStr>(key: &str, val: &str) -> Result<T, ConfigError>
where
    T::Err: core::fmt::Display,
{
    val.trim().parse().map_err(|e| ConfigError::Invalid {
        reason: format!("{key}={val:?}: {e}"),
    })
}

const fn default_grid_size() -> usize {
    10
}

const fn default_window_seconds() -> u64 {
    60
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    4000
}

const fn default_broadcast_capacity() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_owned()
}
