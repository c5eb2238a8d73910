//! FieldTrail Core - field-level change tracking for persisted entities
//!
//! This crate captures an entity's reportable field values before a
//! mutation and, once the mutation is committed, emits one
//! `user.settings.changed` event per field whose value changed:
//! - Per-entity-kind exclusion policy (excluded, redacted, relation fields)
//! - Snapshot store keyed by entity identity with scoped release
//! - Diff engine producing ordered field changes
//! - Serializer registry for primitive and composite field kinds
//! - Event emitter with text truncation and pluggable sinks
//! - YAML configuration and an in-memory tracked store

pub mod config;
pub mod diff;
pub mod emit;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod policy;
pub mod serializer;
pub mod snapshot;
pub mod store;
pub mod tracker;

pub use fieldtrail_core_types as types;

// Re-export commonly used types
pub use config::{EntityConfig, TrackingConfig};
pub use diff::{compute_changes, ChangeValues, FieldChange};
pub use emit::{EventEmitter, EventSink, JsonLinesSink, MemorySink, SettingChangedEvent, TracingSink};
pub use errors::{ExError, ExErrorKind, FieldTrailError, Result};
pub use model::{Composite, Country, EntityKey, FieldKind, FieldMap, FieldValue, Record, TrackedEntity};
pub use policy::{EntityPolicy, ExclusionPolicy};
pub use serializer::SerializerRegistry;
pub use snapshot::{Snapshot, SnapshotHandle, SnapshotStore};
pub use store::TrackedStore;
pub use tracker::{ChangeTracker, MutationGuard, Tracked};
