#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;
use std::sync::Arc;

use fieldtrail_core::types::ActorId;
use fieldtrail_core::{
    ChangeTracker, FieldTrailError, MemorySink, Record, SerializerRegistry, TrackingConfig,
};
use serde_json::json;

const CONFIG: &str = r#"
max_value_length: 8
entities:
  - kind: user
    table: auth_user
    exclude_relations: true
    redacted: [password]
    fields:
      - { name: username, kind: text }
      - { name: bio, kind: text }
      - { name: password, kind: text }
      - { name: groups, kind: relation }
"#;

#[test]
fn test_tracker_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let config = TrackingConfig::from_path(file.path()).unwrap();
    let sink = Arc::new(MemorySink::new());
    let tracker = ChangeTracker::from_config(&config, SerializerRegistry::with_defaults(), sink.clone()).unwrap();

    let mut record = Record::new("user", "1").with_field("bio", "short");
    tracker
        .track(&mut record, &ActorId::new("1"), |r| {
            r.set("bio", "a much longer biography");
            Ok::<_, String>(())
        })
        .unwrap();

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].old_value, json!("short"));
    assert_eq!(events[0].new_value, json!("a much l"));
    assert_eq!(events[0].truncated, vec!["new_value".to_string()]);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = TrackingConfig::from_path(dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(err, FieldTrailError::Io { .. }));
}

#[test]
fn test_unregistered_composite_rejected_at_startup() {
    let yaml = r#"
entities:
  - kind: user_profile
    table: auth_userprofile
    fields:
      - { name: language, kind: language_proficiency }
"#;
    let config = TrackingConfig::from_yaml_str(yaml).unwrap();
    let err = ChangeTracker::from_config(&config, SerializerRegistry::with_defaults(), Arc::new(MemorySink::new()))
        .unwrap_err();

    match err {
        FieldTrailError::UnregisteredFieldKind { entity_kind, field, field_kind } => {
            assert_eq!(entity_kind, "user_profile");
            assert_eq!(field, "language");
            assert_eq!(field_kind, "language_proficiency");
        }
        other => panic!("expected UnregisteredFieldKind, got {other:?}"),
    }
}

#[test]
fn test_unregistered_composite_allowed_when_excluded() {
    let yaml = r#"
entities:
  - kind: user_profile
    table: auth_userprofile
    excluded: [language]
    fields:
      - { name: language, kind: language_proficiency }
"#;
    let config = TrackingConfig::from_yaml_str(yaml).unwrap();
    assert!(
        ChangeTracker::from_config(&config, SerializerRegistry::with_defaults(), Arc::new(MemorySink::new())).is_ok()
    );
}

#[test]
fn test_duplicate_entity_kind_rejected() {
    let yaml = r#"
entities:
  - { kind: user, table: auth_user }
  - { kind: user, table: auth_user_copy }
"#;
    let err = TrackingConfig::from_yaml_str(yaml).unwrap().to_policy().unwrap_err();
    assert!(matches!(err, FieldTrailError::DuplicateEntityKind { .. }));
}
