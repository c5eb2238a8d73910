#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{actor, new_tracker, save, UserProfile};
use fieldtrail_core::types::schema::SETTING_CHANGED_EVENT_NAME;
use fieldtrail_core::{Country, TrackedEntity};
use serde_json::json;

fn profile() -> UserProfile {
    UserProfile::new(7, 3, "Ada Lovelace")
}

#[test]
fn test_save_without_changes_emits_nothing() {
    let (tracker, sink) = new_tracker();
    let mut profile = profile();

    let events = save(&tracker, &mut profile, |_| {});

    assert!(events.is_empty());
    assert!(sink.is_empty());
}

#[test]
fn test_single_field_change() {
    let (tracker, sink) = new_tracker();
    let mut profile = profile();

    save(&tracker, &mut profile, |p| p.year_of_birth = Some(1815));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.event_name, SETTING_CHANGED_EVENT_NAME);
    assert_eq!(event.table, "auth_userprofile");
    assert_eq!(event.setting, "year_of_birth");
    assert_eq!(event.old_value, json!(null));
    assert_eq!(event.new_value, json!(1815));
    assert_eq!(event.user_id, actor());

    assert!(!tracker.snapshots().is_tracking(&profile.entity_key()));
}

#[test]
fn test_multiple_fields_emit_in_declaration_order() {
    let (tracker, sink) = new_tracker();
    let mut profile = profile();

    save(&tracker, &mut profile, |p| {
        p.bio = Some("Analyst".to_string());
        p.gender = Some("f".to_string());
    });

    let settings: Vec<_> = sink.events().into_iter().map(|e| e.setting).collect();
    assert_eq!(settings, vec!["gender", "bio"]);
}

#[test]
fn test_unicode_value() {
    let (tracker, sink) = new_tracker();
    let mut profile = profile();

    save(&tracker, &mut profile, |p| p.name = "Dånîél".to_string());

    let events = sink.events_for("name");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].old_value, json!("Ada Lovelace"));
    assert_eq!(events[0].new_value, json!("Dånîél"));
}

#[test]
fn test_country_composite() {
    let (tracker, sink) = new_tracker();
    let mut profile = profile();

    save(&tracker, &mut profile, |p| p.country = Some(Country::new("AL", "Albania")));

    let events = sink.events_for("country");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].old_value, json!(null));
    assert_eq!(events[0].new_value, json!({"code": "AL", "name": "Albania"}));
}

#[test]
fn test_same_country_is_not_a_change() {
    let (tracker, sink) = new_tracker();
    let mut profile = profile();
    profile.country = Some(Country::new("AL", "Albania"));

    save(&tracker, &mut profile, |p| p.country = Some(Country::new("AL", "Albania")));

    assert!(sink.is_empty());
}

#[test]
fn test_excluded_field_is_ignored() {
    let (tracker, sink) = new_tracker();
    let mut profile = profile();

    save(&tracker, &mut profile, |p| p.meta = json!({"learning": ["rust"]}));

    assert!(sink.is_empty());
}

#[test]
fn test_excluded_change_alongside_reported_change() {
    let (tracker, sink) = new_tracker();
    let mut profile = profile();

    save(&tracker, &mut profile, |p| {
        p.meta = json!({"seen": true});
        p.bio = Some("hello".to_string());
    });

    let settings: Vec<_> = sink.events().into_iter().map(|e| e.setting).collect();
    assert_eq!(settings, vec!["bio"]);
}

#[test]
fn test_successive_saves_diff_against_latest_commit() {
    let (tracker, sink) = new_tracker();
    let mut profile = profile();

    save(&tracker, &mut profile, |p| p.year_of_birth = Some(1815));
    save(&tracker, &mut profile, |p| p.year_of_birth = Some(1816));

    let events = sink.events_for("year_of_birth");
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].old_value, json!(1815));
    assert_eq!(events[1].new_value, json!(1816));
}
