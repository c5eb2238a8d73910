use serde::{Deserialize, Serialize};

use super::value::Composite;

/// Country selection stored as an ISO code plus its display name
///
/// Registered by `SerializerRegistry::with_defaults()`; serializes to
/// `{"code": .., "name": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
}

impl Country {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl Composite for Country {
    const KIND: &'static str = "country";
}
