//! Diff output types.

use fieldtrail_core_types::Sensitive;

use crate::model::{FieldKind, FieldValue};

/// Old and new value of a changed field
#[derive(Debug, Clone)]
pub enum ChangeValues {
    Plain { old: FieldValue, new: FieldValue },
    /// Values of a redacted field; never serialized, never shown in `Debug`
    Redacted(Sensitive<(FieldValue, FieldValue)>),
}

/// One changed field produced by the diff engine
#[derive(Debug, Clone)]
pub struct FieldChange {
    pub field: String,
    /// Declared kind, or the kind implied by the values when undeclared
    pub kind: FieldKind,
    pub values: ChangeValues,
}

impl FieldChange {
    pub fn is_redacted(&self) -> bool {
        matches!(self.values, ChangeValues::Redacted(_))
    }

    /// Old value, `None` when redacted
    pub fn old(&self) -> Option<&FieldValue> {
        match &self.values {
            ChangeValues::Plain { old, .. } => Some(old),
            ChangeValues::Redacted(_) => None,
        }
    }

    /// New value, `None` when redacted
    pub fn new_value(&self) -> Option<&FieldValue> {
        match &self.values {
            ChangeValues::Plain { new, .. } => Some(new),
            ChangeValues::Redacted(_) => None,
        }
    }
}
