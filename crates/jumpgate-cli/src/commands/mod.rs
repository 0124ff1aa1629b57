//! CLI command implementations

pub mod batch;
pub mod config;
pub mod db;
pub mod route;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use jumpgate_backend::RouteService;
use jumpgate_config::{ConfigLoader, ConfigOverrides, JumpgateConfig};

use crate::GlobalOptions;

/// Output format shared by commands that print results
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

/// Working directory that local config and relative paths resolve against.
pub fn workdir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

/// Load configuration (global -> local or `--config` file -> CLI flags).
pub fn load_config(global: &GlobalOptions, workdir: &Path) -> Result<JumpgateConfig> {
    load_config_with(global, workdir, ConfigOverrides::default())
}

/// Like [`load_config`], with command-specific overrides on top of the
/// global flags.
pub fn load_config_with(
    global: &GlobalOptions,
    workdir: &Path,
    extra: ConfigOverrides,
) -> Result<JumpgateConfig> {
    let mut loader = ConfigLoader::new();
    let mut overrides = global.to_config_overrides();
    if extra.oracle_enabled.is_some() {
        overrides.oracle_enabled = extra.oracle_enabled;
    }
    if extra.search_depth.is_some() {
        overrides.search_depth = extra.search_depth;
    }

    match global.config {
        Some(ref path) => loader
            .load_with_file(path, Some(&overrides))
            .with_context(|| format!("Failed to load config file {}", path.display())),
        None => loader
            .load(workdir, Some(&overrides))
            .context("Failed to load configuration"),
    }
}

/// Build the route service for the current working directory.
pub fn create_service(global: &GlobalOptions, extra: ConfigOverrides) -> Result<RouteService> {
    let workdir = workdir()?;
    let config = load_config_with(global, &workdir, extra)?;

    RouteService::from_config(&config, &workdir).with_context(|| {
        format!(
            "Failed to open link store {} (run `jumpgate db init` first?)",
            config.database_path(&workdir).display()
        )
    })
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
