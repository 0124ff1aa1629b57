//! Db command - link store management

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use jumpgate_core::{
    CollectionRecord, JumpRow, LinkRecord, LinkScope, LinkStore, LinkType, SystemRecord,
    LINK_STORE_SCHEMA_VERSION,
};
use tracing::{info, warn};

use super::{load_config, print_info, workdir};
use crate::GlobalOptions;

/// Link store commands
#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Create the link store schema
    Init(InitArgs),
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Load a small demo network into an empty store
    #[arg(long)]
    seed: bool,
}

/// Execute the db command
pub async fn execute(cmd: DbCommand, global: GlobalOptions) -> Result<()> {
    match cmd {
        DbCommand::Init(args) => execute_init(args, global),
    }
}

fn execute_init(args: InitArgs, global: GlobalOptions) -> Result<()> {
    let workdir = workdir()?;
    let config = load_config(&global, &workdir)?;
    let path = config.database_path(&workdir);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let store = LinkStore::open(&path)
        .with_context(|| format!("Failed to open link store {}", path.display()))?;
    store.init_schema().context("Failed to create schema")?;
    info!(
        "Link store {} at schema version {}",
        path.display(),
        LINK_STORE_SCHEMA_VERSION
    );

    if args.seed {
        if store.static_rows()?.is_empty() {
            seed_demo(&store).context("Failed to load demo network")?;
            print_info("Loaded demo network", global.quiet);
        } else {
            warn!("Link store already holds catalog rows, not seeding");
        }
    }

    print_info(&format!("Initialized {}", path.display()), global.quiet);
    Ok(())
}

// ============================================================================
// Demo network
// ============================================================================
//
//   Aurel (1.0) - Brisa (0.8) - Cendra (0.6) - Esker (0.9)
//        \                                    /
//         `-------- Dovan (0.3) -------------'
//
// Collection 1 holds a wormhole Aurel - Esker.

const DEMO_SYSTEMS: [(u64, &str, f64, &str); 5] = [
    (30000001, "Aurel", 1.0, "Brisa:Dovan"),
    (30000002, "Brisa", 0.8, "Aurel:Cendra"),
    (30000003, "Cendra", 0.6, "Brisa:Esker"),
    (30000004, "Dovan", 0.3, "Aurel:Esker"),
    (30000005, "Esker", 0.9, "Cendra:Dovan"),
];

fn seed_demo(store: &LinkStore) -> jumpgate_core::Result<()> {
    for (system_id, name, security, jump_nodes) in DEMO_SYSTEMS {
        store.insert_static_row(&JumpRow {
            system_id,
            name: name.to_string(),
            region_id: 10000001,
            constellation_id: 20000001,
            security,
            jump_nodes: jump_nodes.to_string(),
        })?;
    }

    store.insert_collection(&CollectionRecord {
        id: 1,
        name: "Demo chain".to_string(),
        active: true,
    })?;

    let mut keys = Vec::new();
    for (system_id, name, security, _) in [DEMO_SYSTEMS[0], DEMO_SYSTEMS[4]] {
        keys.push(store.insert_system(&SystemRecord {
            key: 0,
            collection_id: 1,
            system_id,
            name: name.to_string(),
            region_id: 10000001,
            constellation_id: 20000001,
            security,
            active: true,
        })?);
    }

    store.insert_link(&LinkRecord {
        collection_id: 1,
        source: keys[0],
        target: keys[1],
        scope: LinkScope::Wormhole,
        types: vec![LinkType::WormholeFresh],
        eol: false,
        active: true,
    })?;

    Ok(())
}
