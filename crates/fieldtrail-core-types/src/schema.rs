//! Canonical schema constants for structured logging and events
//!
//! These constants keep log field keys and event names consistent between
//! the engine, its sinks and the test capture layer.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_MUTATION_ID: &str = "mutation_id";

// Entity identifiers
pub const FIELD_ENTITY_KIND: &str = "entity_kind";
pub const FIELD_ENTITY_ID: &str = "entity_id";
pub const FIELD_SETTING: &str = "setting";

// Counters
pub const FIELD_EVENTS_EMITTED: &str = "events_emitted";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical log event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

/// Taxonomy tag carried by every emitted setting-changed event
pub const SETTING_CHANGED_EVENT_NAME: &str = "user.settings.changed";
