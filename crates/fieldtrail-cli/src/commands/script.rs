//! Replay script format
//!
//! ```json
//! {
//!   "actor": "42",
//!   "records": [
//!     { "kind": "user", "id": "1", "fields": { "username": "ada" } }
//!   ],
//!   "mutations": [
//!     { "kind": "user", "id": "1", "set": { "email": "foo@bar.com" }, "unset": ["bio"] }
//!   ]
//! }
//! ```
//!
//! Field values are plain JSON decoded by the field's declared kind. `unset`
//! sets a field back to null.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use fieldtrail_core::{Country, EntityPolicy, FieldKind, FieldValue, Record};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    pub actor: String,
    #[serde(default)]
    pub records: Vec<ScriptRecord>,
    #[serde(default)]
    pub mutations: Vec<ScriptMutation>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptRecord {
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptMutation {
    pub kind: String,
    pub id: String,
    /// Overrides the script-level actor
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub set: BTreeMap<String, Value>,
    #[serde(default)]
    pub unset: Vec<String>,
    /// Simulate a failed mutation; the record is left untouched
    #[serde(default)]
    pub fail: Option<String>,
}

/// Decode one JSON value as a field of the given declared kind
pub fn decode_value(kind: &FieldKind, value: &Value) -> Result<FieldValue, String> {
    if value.is_null() {
        return Ok(FieldValue::Null);
    }

    let mismatch = || format!("expected {} value, got {}", kind, value);
    match kind {
        FieldKind::Bool => value.as_bool().map(FieldValue::Bool).ok_or_else(mismatch),
        FieldKind::Integer => value.as_i64().map(FieldValue::Integer).ok_or_else(mismatch),
        FieldKind::Float => value.as_f64().map(FieldValue::Float).ok_or_else(mismatch),
        FieldKind::Text => value.as_str().map(FieldValue::text).ok_or_else(mismatch),
        FieldKind::Timestamp => {
            let text = value.as_str().ok_or_else(mismatch)?;
            DateTime::parse_from_rfc3339(text)
                .map(|ts| FieldValue::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|e| format!("invalid timestamp '{}': {}", text, e))
        }
        FieldKind::Json => Ok(FieldValue::Json(value.clone())),
        FieldKind::Relation => {
            let items = value.as_array().ok_or_else(mismatch)?;
            items
                .iter()
                .map(|item| match item {
                    Value::String(id) => Ok(id.clone()),
                    Value::Number(id) => Ok(id.to_string()),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::Related)
        }
        FieldKind::Composite(name) if name == "country" => serde_json::from_value::<Country>(value.clone())
            .map(FieldValue::composite)
            .map_err(|e| format!("invalid country: {}", e)),
        FieldKind::Composite(name) => Err(format!("composite kind '{}' cannot be scripted", name)),
    }
}

fn declared_kind<'a>(policy: &'a EntityPolicy, field: &str) -> Result<&'a FieldKind, String> {
    policy
        .declared_kind(field)
        .ok_or_else(|| format!("field {}.{} is not declared", policy.kind(), field))
}

/// Build a record holding every declared field in declaration order
///
/// Fields the script leaves out are stored as null, so each record of a kind
/// has the same fixed field set.
pub fn build_record(policy: &EntityPolicy, record: &ScriptRecord) -> Result<Record, String> {
    if let Some(field) = record.fields.keys().find(|name| !policy.schema().declares(name)) {
        return Err(format!("field {}.{} is not declared", record.kind, field));
    }

    let mut built = Record::new(&record.kind, &record.id);
    for def in policy.schema().fields() {
        let decoded = match record.fields.get(&def.name) {
            Some(value) => {
                decode_value(&def.kind, value).map_err(|e| format!("{}.{}: {}", record.kind, def.name, e))?
            }
            None => FieldValue::Null,
        };
        built.set(&def.name, decoded);
    }
    Ok(built)
}

/// Decode the `set` half of a mutation into (field, value) pairs, in
/// declaration order
pub fn decode_assignments(
    policy: &EntityPolicy,
    mutation: &ScriptMutation,
) -> Result<Vec<(String, FieldValue)>, String> {
    for field in mutation.set.keys() {
        declared_kind(policy, field)?;
    }

    policy
        .schema()
        .fields()
        .iter()
        .filter_map(|def| mutation.set.get(&def.name).map(|value| (def, value)))
        .map(|(def, value)| {
            let decoded =
                decode_value(&def.kind, value).map_err(|e| format!("{}.{}: {}", mutation.kind, def.name, e))?;
            Ok((def.name.clone(), decoded))
        })
        .collect()
}
