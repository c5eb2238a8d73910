use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A structured field value type with a registered kind name
///
/// Implement this for any host type that should be storable in a
/// [`FieldValue::Composite`] slot. The serializer registry looks serializers up
/// by `KIND`, and equality between two composite values delegates to the
/// type's own `PartialEq`.
pub trait Composite: PartialEq + fmt::Debug + Send + Sync + 'static {
    const KIND: &'static str;
}

/// Object-safe view of a [`Composite`]
///
/// Blanket-implemented; host code never implements this directly.
pub trait CompositeValue: fmt::Debug + Send + Sync {
    fn composite_kind(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
    fn eq_composite(&self, other: &dyn CompositeValue) -> bool;
}

impl<T: Composite> CompositeValue for T {
    fn composite_kind(&self) -> &str {
        T::KIND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_composite(&self, other: &dyn CompositeValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// Value of one entity field as seen by the change tracker
///
/// Cloning is shallow: composite values are shared behind an `Arc` and are
/// treated as immutable (a mutation replaces the value, it never edits it in
/// place).
///
/// Equality is the diff engine's notion of "unchanged": scalars compare by
/// value, composites structurally, and `Absent` is equal to `Null` so a field
/// that appears with no value is not reported.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Field missing from one side of a comparison
    Absent,
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
    Composite(Arc<dyn CompositeValue>),
    /// Ids of records reached through a relation or reverse-relation
    Related(Vec<String>),
}

impl FieldValue {
    pub fn composite<T: Composite>(value: T) -> Self {
        Self::Composite(Arc::new(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn related<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Related(ids.into_iter().map(Into::into).collect())
    }

    /// True for `Absent` and `Null`
    pub fn is_empty_value(&self) -> bool {
        matches!(self, Self::Absent | Self::Null)
    }

    /// Downcast a composite value to its concrete type
    pub fn as_composite<T: Composite>(&self) -> Option<&T> {
        match self {
            Self::Composite(value) => value.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_empty_value() && b.is_empty_value() => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            // NaN never equals itself; treat two NaNs as unchanged
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            (Self::Composite(a), Self::Composite(b)) => a.eq_composite(b.as_ref()),
            (Self::Related(a), Self::Related(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
