#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{actor, new_tracker, User};
use fieldtrail_core::errors::FieldTrailError;
use fieldtrail_core::logging_facility::test_capture::init_test_capture;
use fieldtrail_core::types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use fieldtrail_core::{log_op_end, log_op_error, log_op_start};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    assert_eq!(capture.events_for(op_name, EVENT_START).len(), 1);
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let end_events = capture.events_for(op_name, EVENT_END);
    assert_eq!(end_events.len(), 1);
    assert_eq!(end_events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = FieldTrailError::UnknownEntityKind {
        entity_kind: "group".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let error_events = capture.events_for(op_name, EVENT_END_ERROR);
    assert_eq!(error_events.len(), 1);
    assert_eq!(error_events[0].field("err.code"), Some("ERR_UNKNOWN_ENTITY_KIND"));
    assert_eq!(error_events[0].field("err.kind"), Some("UnknownEntityKind"));
}

#[test]
fn test_commit_logs_one_start_and_one_end() {
    let capture = init_test_capture();
    let (tracker, _sink) = new_tracker();
    let mut user = User::new(9001, "logged");

    let guard = tracker.before_mutation(&user).unwrap();
    user.email = "x@y.z".to_string();
    user.is_staff = true;
    guard.after_commit(&user, &actor()).unwrap();

    let for_user = |event: &str| {
        capture
            .events_for("emit_changes", event)
            .into_iter()
            .filter(|e| e.field("entity_id") == Some("9001"))
            .collect::<Vec<_>>()
    };
    assert_eq!(for_user(EVENT_START).len(), 1);
    let ends = for_user(EVENT_END);
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].field("events_emitted"), Some("2"));
    assert_eq!(ends[0].field("entity_kind"), Some("user"));
    assert!(ends[0].field("duration_ms").is_some());
    assert!(for_user(EVENT_END_ERROR).is_empty());
}

#[test]
fn test_failed_commit_logs_error_with_code() {
    let capture = init_test_capture();
    let (tracker, _sink) = new_tracker();
    let user = User::new(9002, "mismatch");
    let other = User::new(9003, "other");

    let guard = tracker.before_mutation(&user).unwrap();
    assert!(guard.after_commit(&other, &actor()).is_err());

    let errors: Vec<_> = capture
        .events_for("emit_changes", EVENT_END_ERROR)
        .into_iter()
        .filter(|e| e.field("entity_id") == Some("9002"))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field("err.code"), Some("ERR_MUTATION_FAILED"));
}

#[test]
fn test_redacted_values_never_logged() {
    let capture = init_test_capture();
    let (tracker, _sink) = new_tracker();
    let mut user = User::new(9004, "secret");

    let guard = tracker.before_mutation(&user).unwrap();
    user.password = "hunter2-logged".to_string();
    guard.after_commit(&user, &actor()).unwrap();

    let leaked = capture.count_events(|e| e.fields.values().any(|v| v.contains("hunter2-logged")));
    assert_eq!(leaked, 0);
}
