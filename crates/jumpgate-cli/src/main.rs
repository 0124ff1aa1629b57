//! Jumpgate CLI - jump-route search over a local link store
//!
//! # Usage
//!
//! ```bash
//! # Create a link store with a small demo network
//! jumpgate db init --seed
//!
//! # Search a route, asking the route oracle first
//! jumpgate route --from 30000001 --to 30000005
//!
//! # Search locally, through the wormholes of collection 1
//! jumpgate route --from 30000001 --to 30000005 --collection 1 --wormholes --no-oracle
//!
//! # Run a batch request
//! jumpgate batch routes.json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use jumpgate_config::LogFormat;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;

/// Jumpgate - jump-route search
#[derive(Parser, Debug)]
#[command(name = "jumpgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Path to the link store database
    #[arg(long, short = 'd', global = true, env = "JUMPGATE_DATABASE")]
    database: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, short = 'c', global = true, env = "JUMPGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Route oracle base URL
    #[arg(long, global = true, env = "JUMPGATE_ORACLE_URL")]
    oracle_url: Option<String>,
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> jumpgate_config::ConfigOverrides {
        jumpgate_config::ConfigOverrides {
            database: self.database.clone(),
            oracle_url: self.oracle_url.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search a single route
    Route(commands::route::RouteArgs),

    /// Search the routes of a batch request file
    Batch(commands::batch::BatchArgs),

    /// Manage the link store
    #[command(subcommand)]
    Db(commands::db::DbCommand),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flags win over the configured level; a broken config file is
    // reported by the command itself
    let logging = commands::workdir()
        .and_then(|dir| commands::load_config(&cli.global, &dir))
        .map(|config| config.logging)
        .unwrap_or_default();

    let level = if cli.global.quiet {
        "error"
    } else if cli.global.verbose {
        "debug"
    } else {
        logging.level.as_str()
    };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Text => {
            tracing::subscriber::set_global_default(builder.with_ansi(true).finish())?
        }
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }

    // Execute the command
    match cli.command {
        Commands::Route(args) => commands::route::execute(args, cli.global).await,
        Commands::Batch(args) => commands::batch::execute(args, cli.global).await,
        Commands::Db(cmd) => commands::db::execute(cmd, cli.global).await,
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global).await,
    }
}
