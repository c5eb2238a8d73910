#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{new_tracker, save, User};
use fieldtrail_core::TrackedEntity;
use serde_json::json;

#[test]
fn test_change_one_field() {
    let (tracker, sink) = new_tracker();
    let mut user = User::new(1, "ada");

    save(&tracker, &mut user, |u| u.username = "new_username".to_string());

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].table, "auth_user");
    assert_eq!(events[0].setting, "username");
    assert_eq!(events[0].old_value, json!("ada"));
    assert_eq!(events[0].new_value, json!("new_username"));
    assert_eq!(events[0].user_id, common::actor());
    assert!(!tracker.snapshots().is_tracking(&user.entity_key()));
}

#[test]
fn test_multiple_fields() {
    let (tracker, sink) = new_tracker();
    let mut user = User::new(1, "ada");

    save(&tracker, &mut user, |u| {
        u.email = "foo@bar.com".to_string();
        u.is_staff = true;
    });

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].table, "auth_user");
    assert_eq!(events[0].setting, "email");
    assert_eq!(events[0].old_value, json!("ada@example.com"));
    assert_eq!(events[0].new_value, json!("foo@bar.com"));
    assert_eq!(events[1].setting, "is_staff");
    assert_eq!(events[1].old_value, json!(false));
    assert_eq!(events[1].new_value, json!(true));
}

#[test]
fn test_redacted_password_reports_nulls() {
    let (tracker, sink) = new_tracker();
    let mut user = User::new(1, "ada");

    save(&tracker, &mut user, |u| u.password = "pbkdf2_sha256$2$salt$other".to_string());

    let events = sink.events_for("password");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].old_value, json!(null));
    assert_eq!(events[0].new_value, json!(null));
}

#[test]
fn test_redacted_value_never_serialized_in_event() {
    let (tracker, sink) = new_tracker();
    let mut user = User::new(1, "ada");

    save(&tracker, &mut user, |u| u.password = "hunter2".to_string());

    let wire = serde_json::to_string(&sink.events()).unwrap();
    assert!(!wire.contains("hunter2"));
    assert!(!wire.contains("pbkdf2"));
}

#[test]
fn test_unchanged_password_emits_nothing() {
    let (tracker, sink) = new_tracker();
    let mut user = User::new(1, "ada");

    save(&tracker, &mut user, |u| u.password = u.password.clone());

    assert!(sink.is_empty());
}

#[test]
fn test_related_fields_ignored() {
    let (tracker, sink) = new_tracker();
    let mut user = User::new(1, "ada");

    save(&tracker, &mut user, |u| {
        u.groups.push("staff".to_string());
        u.password_history.push("7".to_string());
    });

    assert!(sink.is_empty());
}
