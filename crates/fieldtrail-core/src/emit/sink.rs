//! Event sinks
//!
//! The engine hands finished events to an [`EventSink`] and propagates its
//! failures unchanged; delivery, retry and buffering are the sink's concern.

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::emit::event::SettingChangedEvent;
use crate::errors::{ExError, ExErrorKind};

/// Destination for emitted events
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    ///
    /// # Errors
    ///
    /// Any error is returned to the caller of the mutation as `SinkFailed`.
    fn publish(&self, event: &SettingChangedEvent) -> std::result::Result<(), ExError>;
}

/// Collects events in memory (tests, dry runs)
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SettingChangedEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<SettingChangedEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Vec<SettingChangedEvent> {
        self.guard().clone()
    }

    /// Events published for one setting, in publication order
    pub fn events_for(&self, setting: &str) -> Vec<SettingChangedEvent> {
        self.guard()
            .iter()
            .filter(|event| event.setting == setting)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Remove and return everything collected so far
    pub fn drain(&self) -> Vec<SettingChangedEvent> {
        std::mem::take(&mut *self.guard())
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: &SettingChangedEvent) -> std::result::Result<(), ExError> {
        self.guard().push(event.clone());
        Ok(())
    }
}

/// Publishes each event as a structured `tracing` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: &SettingChangedEvent) -> std::result::Result<(), ExError> {
        tracing::info!(
            target: "fieldtrail::events",
            event_name = %event.event_name,
            table = %event.table,
            setting = %event.setting,
            old_value = %event.old_value,
            new_value = %event.new_value,
            user_id = %event.user_id,
            timestamp = %event.timestamp.to_rfc3339(),
        );
        Ok(())
    }
}

/// Writes one JSON object per line to a writer
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn publish(&self, event: &SettingChangedEvent) -> std::result::Result<(), ExError> {
        let line = serde_json::to_string(event).map_err(|e| {
            ExError::new(ExErrorKind::Serialization)
                .with_op("publish")
                .with_field(event.setting.clone())
                .with_message(e.to_string())
        })?;

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{}", line)
            .and_then(|()| writer.flush())
            .map_err(|e| {
                ExError::new(ExErrorKind::SinkFailed)
                    .with_op("publish")
                    .with_message(format!("write failed: {}", e))
            })
    }
}
