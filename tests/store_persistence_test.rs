//! Integration tests for the on-disk store lifecycle.
//!
//! Tests the open/close flow end-to-end:
//! 1. Open a store at a path whose parent directories do not exist yet
//! 2. Write activities, logs, and goals
//! 3. Close the store and reopen the same file
//! 4. Verify everything written is still readable and still cascades

use smarttrack::storage::TrackerConfig;
use smarttrack::{NewActivity, NewGoal, NewLog, Store};
use tempfile::TempDir;

fn sample_activity(name: &str) -> NewActivity {
    NewActivity {
        name: name.to_string(),
        specific: "Swim laps before work".to_string(),
        measurable: "Laps per session".to_string(),
        timebound: "By the end of the quarter".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_open_creates_missing_parent_directories() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("data").join("tracker.db");

    let store = Store::open_at(&path).expect("Failed to open store");
    assert!(path.exists());

    store.close().expect("Failed to close store");
}

#[test]
fn test_open_uses_configured_database_path() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("override.db");

    let config = TrackerConfig {
        database_path: Some(path.clone()),
        ..Default::default()
    };

    let store = Store::open(&config).expect("Failed to open store");
    store.create_activity(&sample_activity("Configured")).unwrap();

    assert!(path.exists());
}

#[test]
fn test_data_survives_close_and_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("tracker.db");

    let store = Store::open_at(&path).expect("Failed to open store");
    let activity = store
        .create_activity(&sample_activity("Swim"))
        .expect("Failed to create activity");
    store
        .create_log(&NewLog {
            activity_id: activity.id,
            text: "20 laps".to_string(),
            metrics: None,
        })
        .unwrap();
    store
        .create_goal(&NewGoal {
            activity_id: activity.id,
            target_value: 100,
            target_date: None,
        })
        .unwrap();
    store.close().expect("Failed to close store");

    let reopened = Store::open_at(&path).expect("Failed to reopen store");
    let stored = reopened
        .get_activity(activity.id)
        .unwrap()
        .expect("Activity lost on reopen");

    assert_eq!(stored.name, "Swim");
    assert_eq!(stored.created_at, activity.created_at);
    assert_eq!(reopened.count_logs(activity.id).unwrap(), 1);
    assert_eq!(reopened.count_goals(activity.id).unwrap(), 1);
}

#[test]
fn test_cascade_rules_hold_after_reopen() {
    // Referential integrity is enabled per connection, so a fresh open
    // must still cascade deletes
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("tracker.db");

    let store = Store::open_at(&path).expect("Failed to open store");
    let activity = store.create_activity(&sample_activity("Rowing")).unwrap();
    store
        .create_log(&NewLog {
            activity_id: activity.id,
            text: "First outing".to_string(),
            metrics: None,
        })
        .unwrap();
    store.close().expect("Failed to close store");

    let reopened = Store::open_at(&path).expect("Failed to reopen store");
    assert_eq!(reopened.delete_activity(activity.id).unwrap(), 1);
    assert_eq!(reopened.count_logs(activity.id).unwrap(), 0);
}

#[test]
fn test_generated_ids_continue_after_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("tracker.db");

    let store = Store::open_at(&path).expect("Failed to open store");
    let first = store.create_activity(&sample_activity("First")).unwrap();
    store.close().expect("Failed to close store");

    let reopened = Store::open_at(&path).expect("Failed to reopen store");
    let second = reopened.create_activity(&sample_activity("Second")).unwrap();

    assert!(second.id > first.id);
}
