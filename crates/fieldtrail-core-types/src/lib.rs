//! Core types shared across fieldtrail facilities
//!
//! This crate provides foundational types used by the change-tracking
//! engine, its logging facility and its command-line front end:
//!
//! - **Correlation types**: MutationId, ActorId
//! - **Sensitive data**: Sensitive<T> marker for automatic redaction
//! - **Schema constants**: Canonical log field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{ActorId, MutationId};
pub use sensitive::Sensitive;
