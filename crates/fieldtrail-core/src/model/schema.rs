use serde::{Deserialize, Serialize};
use std::fmt;

use super::value::FieldValue;

/// Declared kind of an entity field
///
/// Written as a bare name in configuration: the primitive names below, or
/// any other name for a composite kind (`country`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    Bool,
    Integer,
    Float,
    Text,
    Timestamp,
    Json,
    /// Structured value serialized by a registered converter
    Composite(String),
    /// Relation or reverse-relation collection
    Relation,
}

impl FieldKind {
    pub fn composite(name: impl Into<String>) -> Self {
        Self::Composite(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Text => "text",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Json => "json",
            FieldKind::Composite(name) => name,
            FieldKind::Relation => "relation",
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, FieldKind::Relation)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, FieldKind::Composite(_))
    }

    /// Kind implied by a runtime value, `None` for `Absent`/`Null`
    pub fn of_value(value: &FieldValue) -> Option<FieldKind> {
        match value {
            FieldValue::Absent | FieldValue::Null => None,
            FieldValue::Bool(_) => Some(FieldKind::Bool),
            FieldValue::Integer(_) => Some(FieldKind::Integer),
            FieldValue::Float(_) => Some(FieldKind::Float),
            FieldValue::Text(_) => Some(FieldKind::Text),
            FieldValue::Timestamp(_) => Some(FieldKind::Timestamp),
            FieldValue::Json(_) => Some(FieldKind::Json),
            FieldValue::Composite(value) => Some(FieldKind::composite(value.composite_kind())),
            FieldValue::Related(_) => Some(FieldKind::Relation),
        }
    }
}

impl From<String> for FieldKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "bool" => FieldKind::Bool,
            "integer" => FieldKind::Integer,
            "float" => FieldKind::Float,
            "text" => FieldKind::Text,
            "timestamp" => FieldKind::Timestamp,
            "json" => FieldKind::Json,
            "relation" => FieldKind::Relation,
            _ => FieldKind::Composite(name),
        }
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.name().to_string()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One declared field of an entity kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Declared shape of an entity kind: its table label and field list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    kind: String,
    table: String,
    fields: Vec<FieldDef>,
}

impl EntitySchema {
    pub fn new(kind: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            table: table.into(),
            fields: Vec::new(),
        }
    }

    /// Declare a field; redeclaring a name replaces its kind
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.declare(FieldDef::new(name, kind));
        self
    }

    pub fn declare(&mut self, def: FieldDef) {
        match self.fields.iter_mut().find(|existing| existing.name == def.name) {
            Some(existing) => existing.kind = def.kind,
            None => self.fields.push(def),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Table label stamped on emitted events
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|def| def.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}
