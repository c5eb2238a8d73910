use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use fieldtrail_core_types::schema::SETTING_CHANGED_EVENT_NAME;
use fieldtrail_core_types::ActorId;

use crate::diff::{ChangeValues, FieldChange};
use crate::emit::event::SettingChangedEvent;
use crate::emit::sink::EventSink;
use crate::errors::{FieldTrailError, Result};
use crate::model::FieldValue;
use crate::serializer::SerializerRegistry;

/// Longest text value carried in an event before it is truncated
pub const DEFAULT_MAX_VALUE_LENGTH: usize = 12_500;

const OLD_VALUE: &str = "old_value";
const NEW_VALUE: &str = "new_value";

/// Cut an over-long string value to `max` characters.
fn truncate(value: Value, max: Option<usize>) -> (Value, bool) {
    match (value, max) {
        (Value::String(text), Some(max)) if text.chars().count() > max => {
            (Value::String(text.chars().take(max).collect()), true)
        }
        (value, _) => (value, false),
    }
}

/// Turns field changes into setting-changed events and publishes them
pub struct EventEmitter {
    registry: Arc<SerializerRegistry>,
    sink: Arc<dyn EventSink>,
    max_value_length: Option<usize>,
}

impl EventEmitter {
    pub fn new(registry: Arc<SerializerRegistry>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            registry,
            sink,
            max_value_length: Some(DEFAULT_MAX_VALUE_LENGTH),
        }
    }

    /// Set the truncation limit; `None` disables truncation
    pub fn with_max_value_length(mut self, max: Option<usize>) -> Self {
        self.max_value_length = max;
        self
    }

    pub fn max_value_length(&self) -> Option<usize> {
        self.max_value_length
    }

    pub fn registry(&self) -> &SerializerRegistry {
        &self.registry
    }

    fn serialize_side(
        &self,
        entity_kind: &str,
        change: &FieldChange,
        value: &FieldValue,
    ) -> Result<Value> {
        self.registry
            .serialize(&change.kind, value)
            .map_err(|err| match err {
                FieldTrailError::UnregisteredFieldKind { field_kind, .. } => {
                    FieldTrailError::UnregisteredFieldKind {
                        entity_kind: entity_kind.to_string(),
                        field: change.field.clone(),
                        field_kind,
                    }
                }
                FieldTrailError::Serialization { reason, .. } => FieldTrailError::Serialization {
                    field: format!("{}.{}", entity_kind, change.field),
                    reason,
                },
                other => other,
            })
    }

    /// Build one event per change without publishing anything
    ///
    /// # Errors
    ///
    /// Returns the first serialization error; no partial output is produced.
    pub fn build_events(
        &self,
        entity_kind: &str,
        table: &str,
        actor: &ActorId,
        changes: &[FieldChange],
    ) -> Result<Vec<SettingChangedEvent>> {
        let timestamp = Utc::now();
        let mut events = Vec::with_capacity(changes.len());

        for change in changes {
            let (old_value, new_value) = match &change.values {
                ChangeValues::Redacted(_) => (Value::Null, Value::Null),
                ChangeValues::Plain { old, new } => (
                    self.serialize_side(entity_kind, change, old)?,
                    self.serialize_side(entity_kind, change, new)?,
                ),
            };

            let (old_value, old_cut) = truncate(old_value, self.max_value_length);
            let (new_value, new_cut) = truncate(new_value, self.max_value_length);
            let truncated = [(OLD_VALUE, old_cut), (NEW_VALUE, new_cut)]
                .into_iter()
                .filter(|(_, cut)| *cut)
                .map(|(side, _)| side.to_string())
                .collect();

            events.push(SettingChangedEvent {
                event_name: SETTING_CHANGED_EVENT_NAME.to_string(),
                table: table.to_string(),
                setting: change.field.clone(),
                old_value,
                new_value,
                truncated,
                user_id: actor.clone(),
                timestamp,
            });
        }

        Ok(events)
    }

    /// Serialize every change, then publish the events in order
    ///
    /// An empty `changes` slice publishes nothing and never touches the sink.
    ///
    /// # Errors
    ///
    /// - serialization errors, before anything is published
    /// - `SinkFailed` with the sink's own error; events after the failing one
    ///   are not published
    pub fn emit_all(
        &self,
        entity_kind: &str,
        table: &str,
        actor: &ActorId,
        changes: &[FieldChange],
    ) -> Result<Vec<SettingChangedEvent>> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }

        let events = self.build_events(entity_kind, table, actor, changes)?;
        for event in &events {
            self.sink.publish(event).map_err(FieldTrailError::SinkFailed)?;
            tracing::debug!(
                entity_kind = %entity_kind,
                table = %table,
                setting = %event.setting,
                "setting change published"
            );
        }
        Ok(events)
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("registry", &self.registry)
            .field("max_value_length", &self.max_value_length)
            .finish_non_exhaustive()
    }
}
