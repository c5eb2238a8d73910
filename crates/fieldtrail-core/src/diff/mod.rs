//! Field-level diff engine.
//!
//! Compares an entity's current field values against the snapshot captured
//! before its mutation and produces one [`FieldChange`] per reportable field
//! whose value differs.
//!
//! ## Entry point
//!
//! ```ignore
//! use fieldtrail_core::diff::compute_changes;
//!
//! let changes = compute_changes(&entity, &snapshot, policy);
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: changes follow the entity's field order, then any
//!   fields only the snapshot still holds, in snapshot order.
//! - **One change per field**: never an aggregate change.
//! - **Policy applied**: hard-excluded fields yield nothing; redacted fields
//!   yield a change whose values are sealed in `Sensitive`.

pub mod engine;
pub mod model;

pub use engine::compute_changes;
pub use model::{ChangeValues, FieldChange};
