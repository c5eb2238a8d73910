//! In-memory record store wired through a [`ChangeTracker`]
//!
//! Stands in for the host persistence layer: every update captures the
//! stored record, mutates a working copy, commits it and emits change
//! events. A failed update leaves the stored record untouched.

use std::collections::HashMap;

use fieldtrail_core_types::ActorId;

use crate::emit::SettingChangedEvent;
use crate::errors::{FieldTrailError, Result};
use crate::model::{EntityKey, Record};
use crate::tracker::ChangeTracker;

#[derive(Debug)]
pub struct TrackedStore {
    records: HashMap<EntityKey, Record>,
    tracker: ChangeTracker,
}

impl TrackedStore {
    pub fn new(tracker: ChangeTracker) -> Self {
        Self {
            records: HashMap::new(),
            tracker,
        }
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Insert (or overwrite) a record without emitting events
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityKind` if no policy covers the record's kind.
    pub fn insert(&mut self, record: Record) -> Result<()> {
        self.tracker.policy().entity(&record.key().kind)?;
        self.records.insert(record.key(), record);
        Ok(())
    }

    pub fn get(&self, key: &EntityKey) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Apply `mutate` to the stored record and emit its changes
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` if nothing is stored under `key`
    /// - `MutationFailed` if `mutate` fails or changes the record's identity
    /// - `UnregisteredFieldKind` if the mutated record holds a composite
    ///   value with no serializer; nothing is committed
    /// - emission errors; the commit has already happened by then
    pub fn update<Er, F>(&mut self, key: &EntityKey, actor: &ActorId, mutate: F) -> Result<Vec<SettingChangedEvent>>
    where
        Er: std::fmt::Display,
        F: FnOnce(&mut Record) -> std::result::Result<(), Er>,
    {
        let stored = self.records.get(key).ok_or_else(|| FieldTrailError::RecordNotFound {
            entity_kind: key.kind.clone(),
            entity_id: key.id.clone(),
        })?;

        let guard = self.tracker.before_mutation(stored)?;
        let mut working = stored.clone();

        let outcome = match mutate(&mut working) {
            Ok(()) if working.key() != *key => Err("record identity changed".to_string()),
            Ok(()) => Ok(()),
            Err(err) => Err(err.to_string()),
        };

        if let Err(reason) = outcome {
            guard.abort();
            return Err(FieldTrailError::MutationFailed {
                entity_kind: key.kind.clone(),
                entity_id: key.id.clone(),
                reason,
            });
        }

        if let Err(err) = self.tracker.validate_entity(&working) {
            guard.abort();
            return Err(err);
        }

        let events = guard.after_commit(&working, actor);
        self.records.insert(key.clone(), working);
        events
    }
}
