//! Field diff computation.
//!
//! The core entry point is [`compute_changes`], which accepts a tracked
//! entity in its committed state and the snapshot captured before the
//! mutation.

use fieldtrail_core_types::Sensitive;

use crate::diff::model::{ChangeValues, FieldChange};
use crate::model::{FieldKind, FieldValue, TrackedEntity};
use crate::policy::EntityPolicy;
use crate::snapshot::Snapshot;

/// Resolve the kind used to serialize a change.
///
/// Declared kind wins; otherwise the kind implied by whichever side holds a
/// value. At least one side holds a value, or the two would compare equal.
fn change_kind(policy: &EntityPolicy, field: &str, old: &FieldValue, new: &FieldValue) -> FieldKind {
    policy
        .declared_kind(field)
        .cloned()
        .or_else(|| FieldKind::of_value(new))
        .or_else(|| FieldKind::of_value(old))
        .unwrap_or(FieldKind::Json)
}

/// Build the change for one field, or `None` if it is unchanged or excluded.
fn field_change(
    policy: &EntityPolicy,
    field: &str,
    old: &FieldValue,
    new: &FieldValue,
) -> Option<FieldChange> {
    if policy.is_excluded_value(field, new) || policy.is_excluded_value(field, old) {
        return None;
    }
    if old == new {
        return None;
    }

    let kind = change_kind(policy, field, old, new);
    let values = if policy.is_redacted(field) {
        ChangeValues::Redacted(Sensitive::new((old.clone(), new.clone())))
    } else {
        ChangeValues::Plain {
            old: old.clone(),
            new: new.clone(),
        }
    };

    Some(FieldChange {
        field: field.to_string(),
        kind,
        values,
    })
}

/// Compute the reportable field changes of a committed mutation.
///
/// Iterates the entity's current field mapping in order; a field missing
/// from the snapshot is compared against `Absent`. Fields the snapshot holds
/// but the entity no longer exposes are appended afterwards as changes to
/// `Absent`.
pub fn compute_changes<E: TrackedEntity + ?Sized>(
    entity: &E,
    snapshot: &Snapshot,
    policy: &EntityPolicy,
) -> Vec<FieldChange> {
    let current = entity.field_values();
    let mut changes = Vec::new();

    for (field, new) in current.iter() {
        let old = snapshot.value(field);
        if let Some(change) = field_change(policy, field, old, new) {
            changes.push(change);
        }
    }

    for (field, old) in snapshot.values().iter() {
        if current.contains(field) {
            continue;
        }
        if let Some(change) = field_change(policy, field, old, &FieldValue::Absent) {
            changes.push(change);
        }
    }

    tracing::trace!(
        entity_kind = %snapshot.key().kind,
        entity_id = %snapshot.key().id,
        changed = changes.len(),
        "diff computed"
    );

    changes
}
