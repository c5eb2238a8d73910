//! Mutation lifecycle: capture → mutate/commit → diff → emit → release
//!
//! The persistence boundary calls [`ChangeTracker::before_mutation`] before
//! mutating an entity and gets back a [`MutationGuard`]. After the commit it
//! calls [`MutationGuard::after_commit`]; if the mutation fails it drops (or
//! [`abort`](MutationGuard::abort)s) the guard. Either way the snapshot is
//! released when the guard goes out of scope.

use std::sync::Arc;
use std::time::Instant;

use fieldtrail_core_types::ActorId;

use crate::config::TrackingConfig;
use crate::diff::compute_changes;
use crate::emit::{EventEmitter, EventSink, SettingChangedEvent};
use crate::errors::{FieldTrailError, Result};
use crate::model::TrackedEntity;
use crate::policy::ExclusionPolicy;
use crate::serializer::SerializerRegistry;
use crate::snapshot::{SnapshotHandle, SnapshotStore};
use crate::{log_op_end, log_op_error, log_op_start};

const OP_EMIT_CHANGES: &str = "emit_changes";

/// Result of a closure-scoped tracked mutation
#[derive(Debug)]
pub struct Tracked<T> {
    pub value: T,
    pub events: Vec<SettingChangedEvent>,
}

/// Change-tracking engine shared by a persistence layer
///
/// Policy and serializers are fixed at construction. The tracker may be
/// shared across threads; each entity can have one mutation in flight.
#[derive(Debug)]
pub struct ChangeTracker {
    policy: Arc<ExclusionPolicy>,
    emitter: EventEmitter,
    snapshots: SnapshotStore,
}

impl ChangeTracker {
    /// Build a tracker, checking every reportable composite field has a
    /// serializer
    ///
    /// # Errors
    ///
    /// Returns `UnregisteredFieldKind` if the registry cannot serialize a
    /// configured field.
    pub fn new(
        policy: ExclusionPolicy,
        registry: SerializerRegistry,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        registry.validate(&policy)?;
        tracing::info!(entity_kinds = policy.len(), "change tracker ready");
        Ok(Self {
            policy: Arc::new(policy),
            emitter: EventEmitter::new(Arc::new(registry), sink),
            snapshots: SnapshotStore::new(),
        })
    }

    /// Build a tracker from a loaded configuration document
    ///
    /// # Errors
    ///
    /// Returns policy construction errors or `UnregisteredFieldKind`.
    pub fn from_config(
        config: &TrackingConfig,
        registry: SerializerRegistry,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let tracker = Self::new(config.to_policy()?, registry, sink)?;
        Ok(tracker.with_max_value_length(config.max_value_length))
    }

    /// Set the event value truncation limit; `None` disables truncation
    pub fn with_max_value_length(mut self, max: Option<usize>) -> Self {
        self.emitter = self.emitter.with_max_value_length(max);
        self
    }

    pub fn policy(&self) -> &ExclusionPolicy {
        &self.policy
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    /// Capture `entity` ahead of a mutation
    ///
    /// # Errors
    ///
    /// - `UnknownEntityKind` if no policy covers the entity's kind
    /// - `UnregisteredFieldKind` if a reportable composite value has no
    ///   serializer
    /// - `AlreadyTracking` if a mutation of this entity is already in flight
    pub fn before_mutation<E: TrackedEntity + ?Sized>(&self, entity: &E) -> Result<MutationGuard<'_>> {
        self.validate_entity(entity)?;
        let handle = self.snapshots.capture(entity)?;
        Ok(MutationGuard {
            tracker: self,
            handle,
        })
    }

    /// Check `entity` can be reported without committing anything
    ///
    /// Composite values the policy never declared are only known at runtime;
    /// persistence layers call this on the mutated entity before committing.
    ///
    /// # Errors
    ///
    /// - `UnknownEntityKind` if no policy covers the entity's kind
    /// - `UnregisteredFieldKind` if a reportable composite value has no
    ///   serializer
    pub fn validate_entity<E: TrackedEntity + ?Sized>(&self, entity: &E) -> Result<()> {
        let policy = self.policy.entity(entity.entity_kind())?;
        self.emitter.registry().validate_values(policy, &entity.field_values())
    }

    /// Run `mutate` on `entity` as one tracked mutation
    ///
    /// Events are emitted only if `mutate` succeeds; the snapshot is
    /// released in every case.
    ///
    /// # Errors
    ///
    /// - capture errors from [`before_mutation`](Self::before_mutation)
    /// - `MutationFailed` carrying the closure's error message
    /// - emission errors from [`MutationGuard::after_commit`]
    pub fn track<E, T, Er, F>(&self, entity: &mut E, actor: &ActorId, mutate: F) -> Result<Tracked<T>>
    where
        E: TrackedEntity + ?Sized,
        Er: std::fmt::Display,
        F: FnOnce(&mut E) -> std::result::Result<T, Er>,
    {
        let guard = self.before_mutation(&*entity)?;
        match mutate(entity) {
            Ok(value) => {
                let events = guard.after_commit(&*entity, actor)?;
                Ok(Tracked { value, events })
            }
            Err(err) => {
                let key = guard.handle().key().clone();
                guard.abort();
                Err(FieldTrailError::MutationFailed {
                    entity_kind: key.kind,
                    entity_id: key.id,
                    reason: err.to_string(),
                })
            }
        }
    }
}

/// Live capture of one entity; releases its snapshot on drop
#[derive(Debug)]
#[must_use = "dropping the guard releases the snapshot without emitting events"]
pub struct MutationGuard<'a> {
    tracker: &'a ChangeTracker,
    handle: SnapshotHandle,
}

impl MutationGuard<'_> {
    pub fn handle(&self) -> &SnapshotHandle {
        &self.handle
    }

    /// Diff the committed `entity` against its snapshot and emit one event
    /// per reportable changed field
    ///
    /// # Errors
    ///
    /// - `MutationFailed` if `entity` is not the entity that was captured
    /// - serialization errors, with nothing published
    /// - `SinkFailed` from the event sink
    pub fn after_commit<E: TrackedEntity + ?Sized>(
        self,
        entity: &E,
        actor: &ActorId,
    ) -> Result<Vec<SettingChangedEvent>> {
        let started = Instant::now();
        let key = self.handle.key();
        log_op_start!(
            OP_EMIT_CHANGES,
            entity_kind = %key.kind,
            entity_id = %key.id,
            mutation_id = %self.handle.mutation_id()
        );

        let result = self.diff_and_emit(entity, actor);
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(events) => {
                log_op_end!(
                    OP_EMIT_CHANGES,
                    duration_ms = duration_ms,
                    entity_kind = %key.kind,
                    entity_id = %key.id,
                    events_emitted = events.len() as u64
                );
            }
            Err(err) => {
                log_op_error!(
                    OP_EMIT_CHANGES,
                    err.clone(),
                    duration_ms = duration_ms,
                    entity_kind = %key.kind,
                    entity_id = %key.id
                );
            }
        }

        result
    }

    fn diff_and_emit<E: TrackedEntity + ?Sized>(
        &self,
        entity: &E,
        actor: &ActorId,
    ) -> Result<Vec<SettingChangedEvent>> {
        let key = self.handle.key();
        if &entity.entity_key() != key {
            return Err(FieldTrailError::MutationFailed {
                entity_kind: key.kind.clone(),
                entity_id: key.id.clone(),
                reason: format!("committed entity {} does not match capture", entity.entity_key()),
            });
        }

        let policy = self.tracker.policy.entity(&key.kind)?;
        let snapshot = self
            .tracker
            .snapshots
            .get(&self.handle)
            .ok_or_else(|| FieldTrailError::MutationFailed {
                entity_kind: key.kind.clone(),
                entity_id: key.id.clone(),
                reason: "snapshot was released before commit".to_string(),
            })?;

        let changes = compute_changes(entity, &snapshot, policy);
        self.tracker
            .emitter
            .emit_all(&key.kind, policy.table(), actor, &changes)
    }

    /// Release the snapshot without diffing
    pub fn abort(self) {
        tracing::debug!(
            entity_kind = %self.handle.key().kind,
            entity_id = %self.handle.key().id,
            "mutation aborted"
        );
    }
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.tracker.snapshots.release(&self.handle);
    }
}
