//! Route command - search a single route

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use jumpgate_backend::{RouteQuery, RouteResult};
use jumpgate_config::ConfigOverrides;
use jumpgate_core::{CollectionIds, LinkFilterSpec, SecurityMode};

use super::{create_service, OutputFormat};
use crate::GlobalOptions;

/// Security preference
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Flag {
    /// Fewest jumps (default)
    #[default]
    Shortest,
    /// Avoid systems below 0.45 security
    Secure,
    /// Prefer low-security space
    Insecure,
}

impl From<Flag> for SecurityMode {
    fn from(flag: Flag) -> Self {
        match flag {
            Flag::Shortest => SecurityMode::Shortest,
            Flag::Secure => SecurityMode::Secure,
            Flag::Insecure => SecurityMode::Insecure,
        }
    }
}

/// Arguments for the route command
#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Origin system id
    #[arg(long)]
    from: u64,

    /// Destination system id
    #[arg(long)]
    to: u64,

    /// Collection whose links may be used (repeatable)
    #[arg(long = "collection", short = 'm')]
    collections: Vec<i64>,

    /// Expansion ceiling (0 uses the configured search depth)
    #[arg(long, default_value = "0")]
    depth: usize,

    /// Use stargate links
    #[arg(long)]
    stargates: bool,

    /// Use jump bridge links
    #[arg(long)]
    jumpbridges: bool,

    /// Use wormhole links
    #[arg(long)]
    wormholes: bool,

    /// Include mass-reduced wormholes
    #[arg(long)]
    reduced: bool,

    /// Include mass-critical wormholes
    #[arg(long)]
    critical: bool,

    /// Include frigate-only wormholes
    #[arg(long)]
    frigate: bool,

    /// Include end-of-life wormholes
    #[arg(long)]
    eol: bool,

    /// Security preference
    #[arg(long, value_enum, default_value = "shortest")]
    flag: Flag,

    /// Skip the route oracle and search locally
    #[arg(long)]
    no_oracle: bool,

    /// Output format: text (default), json
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    output: OutputFormat,
}

impl RouteArgs {
    fn query(&self) -> RouteQuery {
        RouteQuery {
            from: self.from,
            to: self.to,
            max_depth: self.depth,
            collections: CollectionIds::from_raw(self.collections.iter().copied()),
            filter: LinkFilterSpec {
                stargates: self.stargates,
                jumpbridges: self.jumpbridges,
                wormholes: self.wormholes,
                wormholes_reduced: self.reduced,
                wormholes_critical: self.critical,
                wormholes_frigate: self.frigate,
                wormholes_eol: self.eol,
                flag: self.flag.into(),
            },
        }
    }
}

/// Execute the route command
pub async fn execute(args: RouteArgs, global: GlobalOptions) -> Result<()> {
    let extra = ConfigOverrides {
        oracle_enabled: args.no_oracle.then_some(false),
        ..Default::default()
    };
    let service = create_service(&global, extra)?;

    let result = service
        .search(&args.query())
        .await
        .context("Route search failed")?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_route(&args, &result),
    }

    Ok(())
}

fn print_route(args: &RouteArgs, result: &RouteResult) {
    if !result.found {
        println!(
            "No route from {} to {} ({} search, {} of {} expansions)",
            args.from, args.to, result.search_type, result.depth_searched, result.max_depth
        );
        return;
    }

    println!(
        "Route from {} to {}: {} jumps ({} search)\n",
        args.from, args.to, result.jump_count, result.search_type
    );
    for (i, hop) in result.path.iter().enumerate() {
        match hop.security {
            Some(security) => println!("{:>3}. {} ({:.1})", i, hop.name, security),
            None => println!("{:>3}. {}", i, hop.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RouteArgs,
    }

    #[test]
    fn test_query_from_flags() {
        let harness = Harness::parse_from([
            "route",
            "--from",
            "30000142",
            "--to",
            "30002187",
            "--collection",
            "3",
            "--collection",
            "1",
            "--collection",
            "0",
            "--wormholes",
            "--eol",
            "--flag",
            "secure",
        ]);
        let query = harness.args.query();

        assert_eq!(query.from, 30000142);
        assert_eq!(query.max_depth, 0);
        assert_eq!(query.collections.to_vec(), vec![1, 3]);
        assert!(query.filter.wormholes);
        assert!(query.filter.wormholes_eol);
        assert!(!query.filter.stargates);
        assert_eq!(query.filter.flag, SecurityMode::Secure);
    }
}
