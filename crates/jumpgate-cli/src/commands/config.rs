//! Config command - View and manage configuration
//!
//! - Show the effective configuration and where it was read from
//! - Create a default config file (local or global)

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use jumpgate_config::ConfigLoader;

use super::{load_config, print_info, workdir};
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show(ShowArgs),

    /// Create a default configuration file
    Init(InitArgs),
}

/// Arguments for the show command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Create the global config (~/.jumpgate/config.toml) instead of local
    #[arg(long)]
    global: bool,
}

/// Execute the config command
pub async fn execute(cmd: ConfigCommand, global: GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Show(args) => execute_show(args, global),
        ConfigCommand::Init(args) => execute_init(args, global),
    }
}

fn execute_show(args: ShowArgs, global: GlobalOptions) -> Result<()> {
    let workdir = workdir()?;
    let config = load_config(&global, &workdir)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let loader = ConfigLoader::new();
    let describe = |path: &std::path::Path| {
        if path.exists() {
            "found"
        } else {
            "not found"
        }
    };

    println!("Jumpgate Configuration");
    println!("======================\n");
    match loader.global_config_path() {
        Some(ref path) => println!("Global config: {} ({})", path.display(), describe(path)),
        None => println!("Global config: not available (no home directory)"),
    }
    match global.config {
        Some(ref path) => println!("Config file:   {} ({})", path.display(), describe(path)),
        None => {
            let path = loader.local_config_path(&workdir);
            println!("Local config:  {} ({})", path.display(), describe(&path));
        }
    }
    println!(
        "Link store:    {}\n",
        config.database_path(&workdir).display()
    );

    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}

fn execute_init(args: InitArgs, global: GlobalOptions) -> Result<()> {
    let loader = ConfigLoader::new();

    let path = if args.global {
        loader
            .init_global()
            .context("Failed to create global config")?
    } else {
        loader
            .init_local(&workdir()?)
            .context("Failed to create local config")?
    };

    print_info(&format!("Config at {}", path.display()), global.quiet);
    Ok(())
}
