use std::fmt;

use super::field_map::FieldMap;
use super::value::FieldValue;

/// Identity of a tracked entity: its kind plus its primary key
///
/// Ids are only unique within a kind, so snapshots are keyed on both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub kind: String,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A persisted entity whose field changes are tracked
///
/// Host types implement this to expose their current field values. The
/// engine never stores anything on the entity itself.
pub trait TrackedEntity {
    /// Kind label selecting the exclusion policy (e.g. `"user"`)
    fn entity_kind(&self) -> &str;

    /// Stable primary key
    fn entity_id(&self) -> String;

    /// Current field values in declaration order
    fn field_values(&self) -> FieldMap;

    fn entity_key(&self) -> EntityKey {
        EntityKey::new(self.entity_kind(), self.entity_id())
    }
}

/// Schema-less tracked entity backed by a [`FieldMap`]
///
/// Used by the in-memory store and the CLI; typed host structs implement
/// [`TrackedEntity`] directly instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: String,
    id: String,
    fields: FieldMap,
}

impl Record {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            fields: FieldMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.set(name, value)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.kind, &self.id)
    }
}

impl TrackedEntity for Record {
    fn entity_kind(&self) -> &str {
        &self.kind
    }

    fn entity_id(&self) -> String {
        self.id.clone()
    }

    fn field_values(&self) -> FieldMap {
        self.fields.clone()
    }
}
