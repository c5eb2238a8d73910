//! YAML tracking configuration
//!
//! ```yaml
//! max_value_length: 12500
//! entities:
//!   - kind: user
//!     table: auth_user
//!     exclude_relations: true
//!     excluded: [last_login]
//!     redacted: [password]
//!     fields:
//!       - { name: username, kind: text }
//!       - { name: password, kind: text }
//!       - { name: last_login, kind: timestamp }
//!       - { name: groups, kind: relation }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::emit::DEFAULT_MAX_VALUE_LENGTH;
use crate::errors::{FieldTrailError, Result};
use crate::model::FieldDef;
use crate::policy::{EntityPolicy, ExclusionPolicy};

fn default_max_value_length() -> Option<usize> {
    Some(DEFAULT_MAX_VALUE_LENGTH)
}

/// Root configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackingConfig {
    /// Character limit for serialized text values; `null` disables truncation
    #[serde(default = "default_max_value_length")]
    pub max_value_length: Option<usize>,
    pub entities: Vec<EntityConfig>,
}

/// Policy and field declarations for one entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityConfig {
    pub kind: String,
    pub table: String,
    #[serde(default)]
    pub exclude_relations: bool,
    #[serde(default)]
    pub excluded: Vec<String>,
    #[serde(default)]
    pub redacted: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl TrackingConfig {
    /// Parse a configuration document
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed YAML or unknown keys.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| FieldTrailError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Read and parse a configuration file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `InvalidConfig` if it
    /// cannot be parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| FieldTrailError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| FieldTrailError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Build the validated exclusion policy this document describes
    pub fn to_policy(&self) -> Result<ExclusionPolicy> {
        let entities = self
            .entities
            .iter()
            .map(EntityConfig::to_policy)
            .collect::<Result<Vec<_>>>()?;
        ExclusionPolicy::from_entities(entities)
    }
}

impl EntityConfig {
    pub fn to_policy(&self) -> Result<EntityPolicy> {
        let mut builder = EntityPolicy::builder(&self.kind, &self.table);
        for def in &self.fields {
            builder = builder.field(&def.name, def.kind.clone());
        }
        for name in &self.excluded {
            builder = builder.exclude(name);
        }
        for name in &self.redacted {
            builder = builder.redact(name);
        }
        if self.exclude_relations {
            builder = builder.exclude_relations();
        }
        builder.build()
    }
}
