//! Script replay command
//!
//! Usage: fieldtrail replay <CONFIG> <SCRIPT> [--jsonl]

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use fieldtrail_core::types::ActorId;
use fieldtrail_core::{
    ChangeTracker, EntityKey, EventSink, FieldTrailError, FieldValue, JsonLinesSink, MemorySink, SerializerRegistry,
    TrackedStore, TrackingConfig,
};

use super::script::{build_record, decode_assignments, Script};

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Path to the tracking config YAML file
    pub config: PathBuf,

    /// Path to the JSON replay script
    pub script: PathBuf,

    /// Stream events as JSON lines instead of one JSON array at the end
    #[arg(long)]
    pub jsonl: bool,
}

/// Execute script replay
pub fn execute(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = TrackingConfig::from_path(&args.config)?;
    let raw = std::fs::read_to_string(&args.script)
        .map_err(|e| format!("cannot read {}: {}", args.script.display(), e))?;
    let script: Script = serde_json::from_str(&raw).map_err(|e| format!("invalid script: {}", e))?;

    let memory = Arc::new(MemorySink::new());
    let sink: Arc<dyn EventSink> = if args.jsonl {
        Arc::new(JsonLinesSink::new(std::io::stdout()))
    } else {
        memory.clone()
    };

    let tracker = ChangeTracker::from_config(&config, SerializerRegistry::with_defaults(), sink)?;
    let mut store = TrackedStore::new(tracker);

    for record in &script.records {
        let policy = store.tracker().policy().entity(&record.kind)?;
        let record = build_record(policy, record)?;
        store.insert(record)?;
    }

    let mut emitted = 0;
    let mut failed = 0;
    for (index, mutation) in script.mutations.iter().enumerate() {
        let policy = store.tracker().policy().entity(&mutation.kind)?;
        let assignments = decode_assignments(policy, mutation)?;
        if let Some(field) = mutation.unset.iter().find(|f| !policy.schema().declares(f)) {
            return Err(format!("field {}.{} is not declared", mutation.kind, field).into());
        }

        let key = EntityKey::new(&mutation.kind, &mutation.id);
        let actor = ActorId::new(mutation.actor.as_deref().unwrap_or(&script.actor));
        let result = store.update(&key, &actor, |record| {
            if let Some(reason) = &mutation.fail {
                return Err(reason.clone());
            }
            for (field, value) in assignments {
                record.set(field, value);
            }
            for field in &mutation.unset {
                record.set(field, FieldValue::Null);
            }
            Ok(())
        });

        match result {
            Ok(events) => emitted += events.len(),
            Err(FieldTrailError::MutationFailed { reason, .. }) if mutation.fail.is_some() => {
                failed += 1;
                eprintln!("mutation {} on {} failed: {}", index, key, reason);
            }
            Err(err) => return Err(err.into()),
        }
    }

    if !args.jsonl {
        println!("{}", serde_json::to_string_pretty(&memory.events())?);
    }

    tracing::info!(
        records = script.records.len(),
        mutations = script.mutations.len(),
        failed = failed,
        events_emitted = emitted,
        "replay complete"
    );

    Ok(())
}
