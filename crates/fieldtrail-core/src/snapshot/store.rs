use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fieldtrail_core_types::MutationId;

use crate::errors::{FieldTrailError, Result};
use crate::model::{EntityKey, FieldMap, FieldValue, TrackedEntity};

static ABSENT: FieldValue = FieldValue::Absent;

/// Pre-mutation field values of one entity
///
/// `Debug` lists field names only; captured values may include redacted
/// fields.
pub struct Snapshot {
    key: EntityKey,
    mutation_id: MutationId,
    values: FieldMap,
    captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn mutation_id(&self) -> &MutationId {
        &self.mutation_id
    }

    pub fn values(&self) -> &FieldMap {
        &self.values
    }

    /// Captured value of `field`, `Absent` if it was not present
    pub fn value(&self, field: &str) -> &FieldValue {
        self.values.get(field).unwrap_or(&ABSENT)
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("key", &self.key)
            .field("mutation_id", &self.mutation_id)
            .field("fields", &self.values.names().collect::<Vec<_>>())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Proof of a live capture, needed to read or release it
///
/// A handle only matches the capture that issued it: releasing a stale
/// handle never removes a newer snapshot of the same entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHandle {
    key: EntityKey,
    mutation_id: MutationId,
}

impl SnapshotHandle {
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn mutation_id(&self) -> &MutationId {
        &self.mutation_id
    }
}

/// Keyed store of live snapshots, at most one per entity
///
/// Safe to share between threads; mutations of different entities capture
/// and release independently.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    slots: Mutex<HashMap<EntityKey, Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<EntityKey, Arc<Snapshot>>> {
        // A panic while holding the lock leaves the map itself intact
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy every current field value of `entity` into a new snapshot
    ///
    /// # Errors
    ///
    /// Returns `AlreadyTracking` if a snapshot is already live for the entity.
    pub fn capture<E: TrackedEntity + ?Sized>(&self, entity: &E) -> Result<SnapshotHandle> {
        let key = entity.entity_key();
        let mut slots = self.slots();

        if slots.contains_key(&key) {
            return Err(FieldTrailError::AlreadyTracking {
                entity_kind: key.kind,
                entity_id: key.id,
            });
        }

        let snapshot = Snapshot {
            key: key.clone(),
            mutation_id: MutationId::new(),
            values: entity.field_values(),
            captured_at: Utc::now(),
        };
        let handle = SnapshotHandle {
            key: key.clone(),
            mutation_id: snapshot.mutation_id.clone(),
        };

        tracing::debug!(
            entity_kind = %key.kind,
            entity_id = %key.id,
            mutation_id = %handle.mutation_id,
            fields = snapshot.values.len(),
            "snapshot captured"
        );
        slots.insert(key, Arc::new(snapshot));

        Ok(handle)
    }

    /// The live snapshot issued with `handle`, if still held
    pub fn get(&self, handle: &SnapshotHandle) -> Option<Arc<Snapshot>> {
        self.slots()
            .get(&handle.key)
            .filter(|snapshot| snapshot.mutation_id == handle.mutation_id)
            .cloned()
    }

    /// Drop the snapshot issued with `handle`
    ///
    /// Idempotent. Returns whether a snapshot was removed.
    pub fn release(&self, handle: &SnapshotHandle) -> bool {
        let mut slots = self.slots();
        let matches = slots
            .get(&handle.key)
            .is_some_and(|snapshot| snapshot.mutation_id == handle.mutation_id);
        if matches {
            slots.remove(&handle.key);
            tracing::debug!(
                entity_kind = %handle.key.kind,
                entity_id = %handle.key.id,
                mutation_id = %handle.mutation_id,
                "snapshot released"
            );
        }
        matches
    }

    /// Drop whatever snapshot is live for `key`, ignoring which capture
    /// issued it
    ///
    /// Cleanup only: this also removes a snapshot that a live
    /// `MutationGuard` still owns, whose `after_commit` then fails. Normal
    /// release goes through [`release`](Self::release). Safe to call when
    /// nothing was captured. Returns whether a snapshot was removed.
    pub fn release_key(&self, key: &EntityKey) -> bool {
        self.slots().remove(key).is_some()
    }

    pub fn is_tracking(&self, key: &EntityKey) -> bool {
        self.slots().contains_key(key)
    }

    pub fn live_count(&self) -> usize {
        self.slots().len()
    }
}
