//! Config check command
//!
//! Usage: fieldtrail check <CONFIG>

use clap::Args;
use std::path::PathBuf;

use fieldtrail_core::{SerializerRegistry, TrackingConfig};

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Path to the tracking config YAML file
    pub config: PathBuf,
}

/// Execute config check
pub fn execute(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = TrackingConfig::from_path(&args.config)?;
    let policy = config.to_policy()?;
    SerializerRegistry::with_defaults().validate(&policy)?;

    println!("✓ {} is valid", args.config.display());
    for entity in &config.entities {
        println!(
            "  {} ({}): {} fields, {} excluded, {} redacted{}",
            entity.kind,
            entity.table,
            entity.fields.len(),
            entity.excluded.len(),
            entity.redacted.len(),
            if entity.exclude_relations {
                ", relations excluded"
            } else {
                ""
            }
        );
    }

    Ok(())
}
