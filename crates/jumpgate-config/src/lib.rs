//! Jumpgate Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.jumpgate/config.toml`
//! - Local config: `.jumpgate/config.toml` (in the working directory)
//! - An explicit config file (`--config`), read in place of the local one
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default expansion ceiling for requests that do not set one.
pub const DEFAULT_SEARCH_DEPTH: usize = 7000;

/// Default maximum number of routes per batch.
pub const DEFAULT_ROUTE_LIMIT: usize = 10;

/// Default route oracle base URL.
pub const DEFAULT_ORACLE_URL: &str = "https://esi.evetech.net/latest";

/// Root configuration for Jumpgate.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct JumpgateConfig {
    /// Route search settings
    pub route: RouteConfig,

    /// Link data settings
    pub data: DataConfig,

    /// External route oracle settings
    pub oracle: OracleConfig,

    /// Shared cache store settings
    pub cache: CacheConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Route search configuration.
///
/// # Example TOML
///
/// ```toml
/// [route]
/// search_depth = 7000
/// limit = 10
/// cache_ttl_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RouteConfig {
    /// Expansion ceiling used when a request asks for depth 0
    pub search_depth: usize,

    /// Maximum routes per batch; extra requests are dropped
    pub limit: usize,

    /// Lifetime of cached route results in seconds
    pub cache_ttl_secs: u64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            search_depth: DEFAULT_SEARCH_DEPTH,
            limit: DEFAULT_ROUTE_LIMIT,
            cache_ttl_secs: 10,
        }
    }
}

impl RouteConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Link data configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DataConfig {
    /// SQLite link store path (relative paths resolve against the workdir)
    pub database: PathBuf,

    /// Freshness window of static catalog rows in seconds
    pub static_ttl_secs: u64,

    /// Freshness window of dynamic collection rows in seconds
    pub dynamic_ttl_secs: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("jumpgate.db"),
            static_ttl_secs: 86_400,
            dynamic_ttl_secs: 10,
        }
    }
}

impl DataConfig {
    pub fn static_ttl(&self) -> Duration {
        Duration::from_secs(self.static_ttl_secs)
    }

    pub fn dynamic_ttl(&self) -> Duration {
        Duration::from_secs(self.dynamic_ttl_secs)
    }
}

/// External route oracle configuration.
///
/// # Example TOML
///
/// ```toml
/// [oracle]
/// enabled = true
/// url = "https://esi.evetech.net/latest"
/// datasource = "tranquility"
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    /// Consult the oracle before searching locally
    pub enabled: bool,

    /// API base URL
    pub url: String,

    /// Datasource query parameter
    pub datasource: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_ORACLE_URL.to_string(),
            datasource: "tranquility".to_string(),
            timeout_secs: 10,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Cache store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries held by the in-memory store
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 4096 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override link store path
    pub database: Option<PathBuf>,

    /// Override oracle URL
    pub oracle_url: Option<String>,

    /// Force the oracle on or off
    pub oracle_enabled: Option<bool>,

    /// Override default expansion ceiling
    pub search_depth: Option<usize>,

    /// Override log level
    pub log_level: Option<String>,
}

impl JumpgateConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref database) = overrides.database {
            self.data.database = database.clone();
        }

        if let Some(ref url) = overrides.oracle_url {
            self.oracle.url = url.clone();
        }

        if let Some(enabled) = overrides.oracle_enabled {
            self.oracle.enabled = enabled;
        }

        if let Some(depth) = overrides.search_depth {
            self.route.search_depth = depth;
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.route.limit == 0 {
            return Err(ConfigError::invalid("route.limit", "must be at least 1"));
        }
        if self.route.search_depth == 0 {
            return Err(ConfigError::invalid("route.search_depth", "must be at least 1"));
        }
        if self.oracle.enabled && self.oracle.url.trim().is_empty() {
            return Err(ConfigError::invalid(
                "oracle.url",
                "is required when the oracle is enabled",
            ));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(ConfigError::invalid("oracle.timeout_secs", "must be at least 1"));
        }
        Ok(())
    }

    /// Effective link store path for a working directory.
    pub fn database_path(&self, workdir: &Path) -> PathBuf {
        if self.data.database.is_absolute() {
            self.data.database.clone()
        } else {
            workdir.join(&self.data.database)
        }
    }
}
