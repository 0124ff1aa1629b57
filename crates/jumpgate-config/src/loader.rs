//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.jumpgate/config.toml`
//! 2. Local config: `.jumpgate/config.toml` (in the working directory),
//!    or an explicit file given on the command line
//! 3. CLI overrides
//!
//! Later sources override earlier ones. A field only overrides when it
//! differs from its default, so partial files compose.

use crate::error::ConfigError;
use crate::{
    CacheConfig, ConfigOverrides, DataConfig, JumpgateConfig, LoggingConfig, OracleConfig,
    RouteConfig,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".jumpgate";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".jumpgate";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.jumpgate`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<JumpgateConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.jumpgate`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    ///
    /// Useful for testing.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a working directory.
    pub fn local_config_path(&self, workdir: &Path) -> PathBuf {
        workdir.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a working directory with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides.
    pub fn load(
        &mut self,
        workdir: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<JumpgateConfig, ConfigError> {
        let local = self.load_local(workdir)?;
        self.load_layered(local, overrides)
    }

    /// Like [`load`](Self::load), but reads `path` instead of the local file.
    ///
    /// Unlike the implicit local file, an explicit file must exist.
    pub fn load_with_file(
        &mut self,
        path: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<JumpgateConfig, ConfigError> {
        debug!("Loading config from {:?}", path);
        let explicit = load_config_file(path)?;
        self.load_layered(Some(explicit), overrides)
    }

    fn load_layered(
        &mut self,
        local: Option<JumpgateConfig>,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<JumpgateConfig, ConfigError> {
        let mut config = JumpgateConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = local {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<JumpgateConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;

        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration for a working directory.
    pub fn load_local(&self, workdir: &Path) -> Result<Option<JumpgateConfig>, ConfigError> {
        let local_path = self.local_config_path(workdir);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Save configuration to the local config file for a working directory.
    pub fn save_local(&self, workdir: &Path, config: &JumpgateConfig) -> Result<(), ConfigError> {
        let local_path = self.local_config_path(workdir);
        save_config_file(&local_path, config)
    }

    /// Initialize global configuration.
    ///
    /// Creates `~/.jumpgate/config.toml` with default configuration if absent.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };

        init_config_dir(global_dir)
    }

    /// Initialize local configuration for a working directory.
    ///
    /// Creates `.jumpgate/config.toml` with default configuration if absent.
    pub fn init_local(&self, workdir: &Path) -> Result<PathBuf, ConfigError> {
        init_config_dir(&workdir.join(LOCAL_CONFIG_DIR))
    }

    /// Clear cached global configuration.
    ///
    /// Forces reload on next `load_global()` call.
    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

fn init_config_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::io("create", dir, e))?;
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        save_config_file(&config_path, &JumpgateConfig::default())?;
    }

    Ok(config_path)
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<JumpgateConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io("read", path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse(path, e))
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &JumpgateConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io("create", parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::io("write", path, e))
}

/// `overlay` if it was changed from `default`, otherwise `base`.
fn pick<T: PartialEq>(base: T, overlay: T, default: &T) -> T {
    if overlay != *default {
        overlay
    } else {
        base
    }
}

/// Merge two configurations, with `overlay` taking precedence.
fn merge_configs(base: JumpgateConfig, overlay: JumpgateConfig) -> JumpgateConfig {
    JumpgateConfig {
        route: merge_route(base.route, overlay.route),
        data: merge_data(base.data, overlay.data),
        oracle: merge_oracle(base.oracle, overlay.oracle),
        cache: CacheConfig {
            capacity: pick(
                base.cache.capacity,
                overlay.cache.capacity,
                &CacheConfig::default().capacity,
            ),
        },
        logging: merge_logging(base.logging, overlay.logging),
    }
}

fn merge_route(base: RouteConfig, overlay: RouteConfig) -> RouteConfig {
    let d = RouteConfig::default();
    RouteConfig {
        search_depth: pick(base.search_depth, overlay.search_depth, &d.search_depth),
        limit: pick(base.limit, overlay.limit, &d.limit),
        cache_ttl_secs: pick(base.cache_ttl_secs, overlay.cache_ttl_secs, &d.cache_ttl_secs),
    }
}

fn merge_data(base: DataConfig, overlay: DataConfig) -> DataConfig {
    let d = DataConfig::default();
    DataConfig {
        database: pick(base.database, overlay.database, &d.database),
        static_ttl_secs: pick(
            base.static_ttl_secs,
            overlay.static_ttl_secs,
            &d.static_ttl_secs,
        ),
        dynamic_ttl_secs: pick(
            base.dynamic_ttl_secs,
            overlay.dynamic_ttl_secs,
            &d.dynamic_ttl_secs,
        ),
    }
}

fn merge_oracle(base: OracleConfig, overlay: OracleConfig) -> OracleConfig {
    let d = OracleConfig::default();
    OracleConfig {
        enabled: pick(base.enabled, overlay.enabled, &d.enabled),
        url: pick(base.url, overlay.url, &d.url),
        datasource: pick(base.datasource, overlay.datasource, &d.datasource),
        timeout_secs: pick(base.timeout_secs, overlay.timeout_secs, &d.timeout_secs),
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    let d = LoggingConfig::default();
    LoggingConfig {
        level: pick(base.level, overlay.level, &d.level),
        format: pick(base.format, overlay.format, &d.format),
    }
}
