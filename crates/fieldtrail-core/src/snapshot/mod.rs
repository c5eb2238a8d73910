//! Mutation-scoped snapshots of entity field values
//!
//! A snapshot is captured just before a mutation and released once the
//! mutation's changes have been diffed (or the mutation aborted). Snapshots
//! live in an external keyed store, never on the entity.

pub mod store;

pub use store::{Snapshot, SnapshotHandle, SnapshotStore};
