//! Setting-changed event construction and publication

pub mod emitter;
pub mod event;
pub mod sink;

pub use emitter::{EventEmitter, DEFAULT_MAX_VALUE_LENGTH};
pub use event::SettingChangedEvent;
pub use sink::{EventSink, JsonLinesSink, MemorySink, TracingSink};
