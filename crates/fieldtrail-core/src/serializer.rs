//! Serializer registry: field value → JSON-safe value
//!
//! Primitive kinds pass through unchanged. Composite kinds have no natural
//! JSON form and must be registered by name with a converter; the registry
//! is checked against the configured policy at startup so a missing
//! converter is a configuration error rather than a malformed event.

use serde_json::{Number, Value};
use std::collections::HashMap;
use std::fmt;

use crate::errors::{FieldTrailError, Result};
use crate::model::{Composite, Country, FieldKind, FieldMap, FieldValue};
use crate::policy::{EntityPolicy, ExclusionPolicy};

/// Converter for one composite kind
pub type SerializeFn = Box<dyn Fn(&FieldValue) -> Result<Value> + Send + Sync>;

/// Kind-name → converter table
#[derive(Default)]
pub struct SerializerRegistry {
    composites: HashMap<String, SerializeFn>,
}

impl SerializerRegistry {
    /// Registry that knows only the primitive kinds
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in composites (`country`)
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_composite(|country: &Country| {
            serde_json::json!({ "code": country.code, "name": country.name })
        });
        registry
    }

    /// Register a raw converter for a composite kind name
    ///
    /// Replaces any converter previously registered under the same name.
    pub fn register(&mut self, kind_name: impl Into<String>, convert: SerializeFn) -> &mut Self {
        self.composites.insert(kind_name.into(), convert);
        self
    }

    /// Register a typed converter for a [`Composite`] type under `T::KIND`
    pub fn register_composite<T, F>(&mut self, convert: F) -> &mut Self
    where
        T: Composite,
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.register(
            T::KIND,
            Box::new(move |value: &FieldValue| match value.as_composite::<T>() {
                Some(composite) => Ok(convert(composite)),
                None => Err(FieldTrailError::Serialization {
                    field: T::KIND.to_string(),
                    reason: format!("expected a {} value, got {:?}", T::KIND, value),
                }),
            }),
        )
    }

    /// Whether values of `kind` can be serialized
    pub fn is_registered(&self, kind: &FieldKind) -> bool {
        match kind {
            FieldKind::Composite(name) => self.composites.contains_key(name),
            _ => true,
        }
    }

    /// Check every reportable composite field in `policy` has a converter
    ///
    /// Excluded and redacted fields are skipped: their values are never
    /// serialized.
    ///
    /// # Errors
    ///
    /// Returns `UnregisteredFieldKind` for the first field without one.
    pub fn validate(&self, policy: &ExclusionPolicy) -> Result<()> {
        let mut entities: Vec<_> = policy.entities().collect();
        entities.sort_by(|a, b| a.kind().cmp(b.kind()));

        for entity in entities {
            for def in entity.schema().fields() {
                if entity.is_excluded(&def.name) || entity.is_redacted(&def.name) {
                    continue;
                }
                if !self.is_registered(&def.kind) {
                    return Err(FieldTrailError::UnregisteredFieldKind {
                        entity_kind: entity.kind().to_string(),
                        field: def.name.clone(),
                        field_kind: def.kind.name().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Check every reportable composite value in `values` has a converter
    ///
    /// Covers fields the policy never declared, whose composite kind is only
    /// known at runtime.
    ///
    /// # Errors
    ///
    /// Returns `UnregisteredFieldKind` for the first value without one.
    pub fn validate_values(&self, policy: &EntityPolicy, values: &FieldMap) -> Result<()> {
        for (field, value) in values.iter() {
            let FieldValue::Composite(composite) = value else {
                continue;
            };
            if policy.is_excluded_value(field, value) || policy.is_redacted(field) {
                continue;
            }
            let kind = match policy.declared_kind(field) {
                Some(kind @ FieldKind::Composite(_)) => kind.clone(),
                _ => FieldKind::composite(composite.composite_kind()),
            };
            if !self.is_registered(&kind) {
                return Err(FieldTrailError::UnregisteredFieldKind {
                    entity_kind: policy.kind().to_string(),
                    field: field.to_string(),
                    field_kind: kind.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Convert a value of the declared `kind` to its JSON form
    ///
    /// `Absent` and `Null` become `null`. Non-finite floats have no JSON
    /// representation and also become `null`. A composite value is converted
    /// by the converter registered for the declared composite kind, or for its
    /// own kind when the field was declared as something else.
    ///
    /// # Errors
    ///
    /// - `UnregisteredFieldKind` if no converter exists for a composite value
    /// - `Serialization` if the converter rejects the value
    pub fn serialize(&self, kind: &FieldKind, value: &FieldValue) -> Result<Value> {
        let json = match value {
            FieldValue::Absent | FieldValue::Null => Value::Null,
            FieldValue::Bool(value) => Value::Bool(*value),
            FieldValue::Integer(value) => Value::Number(Number::from(*value)),
            FieldValue::Float(value) => Number::from_f64(*value).map_or(Value::Null, Value::Number),
            FieldValue::Text(value) => Value::String(value.clone()),
            FieldValue::Timestamp(value) => Value::String(value.to_rfc3339()),
            FieldValue::Json(value) => value.clone(),
            FieldValue::Related(ids) => Value::Array(ids.iter().cloned().map(Value::String).collect()),
            FieldValue::Composite(composite) => {
                let name = match kind {
                    FieldKind::Composite(name) => name.as_str(),
                    _ => composite.composite_kind(),
                };
                let convert = self.composites.get(name).ok_or_else(|| {
                    FieldTrailError::UnregisteredFieldKind {
                        entity_kind: String::new(),
                        field: String::new(),
                        field_kind: name.to_string(),
                    }
                })?;
                convert(value)?
            }
        };
        Ok(json)
    }
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.composites.keys().collect();
        kinds.sort();
        f.debug_struct("SerializerRegistry")
            .field("composites", &kinds)
            .finish()
    }
}
