//! Batch command - search every route of a batch request file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use jumpgate_backend::{BatchRequest, BatchResponse, Caller};
use jumpgate_config::ConfigOverrides;

use super::{create_service, print_info, OutputFormat};
use crate::GlobalOptions;

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON file holding `{"routeData": [...]}` (`-` reads stdin)
    file: PathBuf,

    /// Caller identity passed to collection access checks
    #[arg(long, default_value = "local")]
    caller: String,

    /// Output format: json (default), text
    #[arg(long, short = 'o', value_enum, default_value = "json")]
    output: OutputFormat,
}

/// Execute the batch command
pub async fn execute(args: BatchArgs, global: GlobalOptions) -> Result<()> {
    let raw = if args.file.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read batch from stdin")?
    } else {
        std::fs::read_to_string(&args.file)
            .with_context(|| format!("Failed to read {}", args.file.display()))?
    };
    let request: BatchRequest =
        serde_json::from_str(&raw).context("Batch file is not a valid route request")?;

    let service = create_service(&global, ConfigOverrides::default())?;
    print_info(
        &format!("Searching {} routes", request.route_data.len()),
        global.quiet,
    );

    let response = service
        .search_batch(&request, &Caller::new(args.caller))
        .await;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Text => print_batch(&response),
    }

    Ok(())
}

fn print_batch(response: &BatchResponse) {
    for (i, item) in response.routes_data.iter().enumerate() {
        let label = format!("{}. {} -> {}", i + 1, item.from.name, item.to.name);
        match item.result {
            None if item.skip_search => println!("{}: skipped", label),
            None => println!("{}: no accessible collection", label),
            Some(ref result) if result.found => {
                let hops: Vec<&str> = result.path.iter().map(|p| p.name.as_str()).collect();
                println!(
                    "{}: {} jumps ({}) {}",
                    label,
                    result.jump_count,
                    result.search_type,
                    hops.join(" > ")
                );
            }
            Some(ref result) => match result.error {
                Some(ref error) => println!("{}: failed: {}", label, error),
                None => println!("{}: no route", label),
            },
        }
    }
}
