//! Exclusion policy: which field changes are reported, and how
//!
//! Each entity kind carries one [`EntityPolicy`]:
//! - **hard-excluded** fields never produce a change event
//! - **redacted** fields produce an event whose values are always null
//!
//! Relation and collection fields can be excluded by a structural rule
//! (`exclude_relations`) instead of by name. Policies are built once at
//! startup and are read-only afterwards.

use std::collections::{BTreeSet, HashMap};

use crate::errors::{FieldTrailError, Result};
use crate::model::{EntitySchema, FieldKind, FieldValue};

/// Reporting policy for one entity kind
#[derive(Debug, Clone)]
pub struct EntityPolicy {
    schema: EntitySchema,
    excluded: BTreeSet<String>,
    redacted: BTreeSet<String>,
    exclude_relations: bool,
}

impl EntityPolicy {
    pub fn builder(kind: impl Into<String>, table: impl Into<String>) -> EntityPolicyBuilder {
        EntityPolicyBuilder {
            schema: EntitySchema::new(kind, table),
            excluded: BTreeSet::new(),
            redacted: BTreeSet::new(),
            exclude_relations: false,
        }
    }

    pub fn kind(&self) -> &str {
        self.schema.kind()
    }

    pub fn table(&self) -> &str {
        self.schema.table()
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn declared_kind(&self, field: &str) -> Option<&FieldKind> {
        self.schema.field(field).map(|def| &def.kind)
    }

    /// Whether changes to `field` are never reported
    pub fn is_excluded(&self, field: &str) -> bool {
        self.excluded.contains(field)
            || (self.exclude_relations
                && self.declared_kind(field).is_some_and(FieldKind::is_relation))
    }

    /// Like [`is_excluded`](Self::is_excluded), also applying the structural
    /// rule to the runtime value of an undeclared field
    pub fn is_excluded_value(&self, field: &str, value: &FieldValue) -> bool {
        self.is_excluded(field)
            || (self.exclude_relations && matches!(value, FieldValue::Related(_)))
    }

    /// Whether changes to `field` are reported with null values
    pub fn is_redacted(&self, field: &str) -> bool {
        self.redacted.contains(field)
    }

    pub fn excludes_relations(&self) -> bool {
        self.exclude_relations
    }
}

/// Builder for [`EntityPolicy`]
#[derive(Debug, Clone)]
pub struct EntityPolicyBuilder {
    schema: EntitySchema,
    excluded: BTreeSet<String>,
    redacted: BTreeSet<String>,
    exclude_relations: bool,
}

impl EntityPolicyBuilder {
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.schema = self.schema.with_field(name, kind);
        self
    }

    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.excluded.insert(name.into());
        self
    }

    pub fn redact(mut self, name: impl Into<String>) -> Self {
        self.redacted.insert(name.into());
        self
    }

    /// Hard-exclude every relation-valued field
    pub fn exclude_relations(mut self) -> Self {
        self.exclude_relations = true;
        self
    }

    /// Validate and freeze the policy
    ///
    /// # Errors
    ///
    /// - `OverlappingPolicy` if a field is both excluded and redacted
    /// - `UnknownPolicyField` if an excluded or redacted name is not declared
    pub fn build(self) -> Result<EntityPolicy> {
        let kind = self.schema.kind().to_string();

        if let Some(field) = self.excluded.intersection(&self.redacted).next() {
            return Err(FieldTrailError::OverlappingPolicy {
                entity_kind: kind,
                field: field.clone(),
            });
        }

        if let Some(field) = self
            .excluded
            .iter()
            .chain(self.redacted.iter())
            .find(|name| !self.schema.declares(name))
        {
            return Err(FieldTrailError::UnknownPolicyField {
                entity_kind: kind,
                field: field.clone(),
            });
        }

        Ok(EntityPolicy {
            schema: self.schema,
            excluded: self.excluded,
            redacted: self.redacted,
            exclude_relations: self.exclude_relations,
        })
    }
}

/// Process-wide catalog of entity policies, keyed by entity kind
#[derive(Debug, Clone, Default)]
pub struct ExclusionPolicy {
    entities: HashMap<String, EntityPolicy>,
}

impl ExclusionPolicy {
    /// Assemble the catalog from per-kind policies
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntityKind` if two policies share a kind.
    pub fn from_entities<I>(policies: I) -> Result<Self>
    where
        I: IntoIterator<Item = EntityPolicy>,
    {
        let mut entities = HashMap::new();
        for policy in policies {
            let kind = policy.kind().to_string();
            if entities.insert(kind.clone(), policy).is_some() {
                return Err(FieldTrailError::DuplicateEntityKind { entity_kind: kind });
            }
        }
        Ok(Self { entities })
    }

    /// Look up the policy for an entity kind
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityKind` if no policy was configured for `kind`.
    pub fn entity(&self, kind: &str) -> Result<&EntityPolicy> {
        self.entities
            .get(kind)
            .ok_or_else(|| FieldTrailError::UnknownEntityKind {
                entity_kind: kind.to_string(),
            })
    }

    pub fn is_excluded(&self, kind: &str, field: &str) -> bool {
        self.entities
            .get(kind)
            .is_some_and(|policy| policy.is_excluded(field))
    }

    pub fn is_excluded_value(&self, kind: &str, field: &str, value: &FieldValue) -> bool {
        self.entities
            .get(kind)
            .is_some_and(|policy| policy.is_excluded_value(field, value))
    }

    pub fn is_redacted(&self, kind: &str, field: &str) -> bool {
        self.entities
            .get(kind)
            .is_some_and(|policy| policy.is_redacted(field))
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityPolicy> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_policy() -> EntityPolicy {
        EntityPolicy::builder("user", "auth_user")
            .field("username", FieldKind::Text)
            .field("password", FieldKind::Text)
            .field("last_login", FieldKind::Timestamp)
            .field("passwordhistory_set", FieldKind::Relation)
            .exclude("last_login")
            .redact("password")
            .exclude_relations()
            .build()
            .unwrap()
    }

    #[test]
    fn test_named_exclusion() {
        let policy = user_policy();
        assert!(policy.is_excluded("last_login"));
        assert!(!policy.is_excluded("username"));
    }

    #[test]
    fn test_structural_relation_exclusion() {
        let policy = user_policy();
        assert!(policy.is_excluded("passwordhistory_set"));
        assert!(policy.is_excluded_value("groups", &FieldValue::related(["staff"])));
        assert!(!policy.is_excluded_value("groups", &FieldValue::text("staff")));
    }

    #[test]
    fn test_relations_reported_without_structural_rule() {
        let policy = EntityPolicy::builder("user", "auth_user")
            .field("groups", FieldKind::Relation)
            .build()
            .unwrap();
        assert!(!policy.is_excluded("groups"));
    }

    #[test]
    fn test_redaction_lookup() {
        let policy = user_policy();
        assert!(policy.is_redacted("password"));
        assert!(!policy.is_redacted("username"));
    }

    #[test]
    fn test_overlap_is_rejected() {
        let err = EntityPolicy::builder("user", "auth_user")
            .field("password", FieldKind::Text)
            .exclude("password")
            .redact("password")
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldTrailError::OverlappingPolicy { ref field, .. } if field == "password"));
    }

    #[test]
    fn test_undeclared_policy_field_is_rejected() {
        let err = EntityPolicy::builder("user", "auth_user")
            .redact("secret")
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldTrailError::UnknownPolicyField { .. }));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = ExclusionPolicy::from_entities([user_policy()]).unwrap();
        assert!(catalog.is_redacted("user", "password"));
        assert!(catalog.is_excluded("user", "last_login"));
        assert!(!catalog.is_excluded("user-profile", "last_login"));
        assert!(catalog.is_excluded_value("user", "nicknames", &FieldValue::related(["a"])));
        assert!(matches!(
            catalog.entity("user-profile"),
            Err(FieldTrailError::UnknownEntityKind { .. })
        ));
    }

    #[test]
    fn test_duplicate_kind_is_rejected() {
        let err = ExclusionPolicy::from_entities([user_policy(), user_policy()]).unwrap_err();
        assert!(matches!(err, FieldTrailError::DuplicateEntityKind { .. }));
    }
}
