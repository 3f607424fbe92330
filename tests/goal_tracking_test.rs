//! Integration tests for the complete goal tracking flow.
//!
//! Walks the canonical sequence:
//! 1. Declare a SMART activity
//! 2. Attach a quantitative goal
//! 3. Journal progress logs
//! 4. Report progress values and watch the achieved flag follow them

use serde_json::json;
use smarttrack::{NewActivity, NewGoal, NewLog, Store, StoreError};

#[test]
fn test_run_5k_tracking_scenario() {
    let store = Store::open_in_memory().expect("Failed to create store");

    let activity = store
        .create_activity(&NewActivity {
            name: "Run 5k".to_string(),
            specific: "Run".to_string(),
            measurable: "5km".to_string(),
            timebound: "30 days".to_string(),
            ..Default::default()
        })
        .expect("Failed to create activity");

    assert_eq!(activity.id, 1);
    assert!(!activity.completed);

    let goal = store
        .create_goal(&NewGoal {
            activity_id: activity.id,
            target_value: 10,
            target_date: None,
        })
        .expect("Failed to create goal");

    assert_eq!(goal.current_value, 0);
    assert!(!goal.achieved);

    let achieved = store
        .update_goal_progress(goal.id, 10)
        .expect("Failed to update progress");
    assert_eq!(achieved.current_value, 10);
    assert!(achieved.achieved);

    let regressed = store
        .update_goal_progress(goal.id, 9)
        .expect("Failed to update progress");
    assert_eq!(regressed.current_value, 9);
    assert!(!regressed.achieved);
}

#[test]
fn test_progress_journal_accumulates_newest_first() {
    let store = Store::open_in_memory().expect("Failed to create store");

    let activity = store
        .create_activity(&NewActivity {
            name: "Run 5k".to_string(),
            specific: "Run three times a week".to_string(),
            measurable: "Distance per run".to_string(),
            timebound: "30 days".to_string(),
            ..Default::default()
        })
        .unwrap();

    for (text, km) in [("Easy pace", 3.0), ("Intervals", 4.5), ("Long run", 6.0)] {
        store
            .create_log(&NewLog {
                activity_id: activity.id,
                text: text.to_string(),
                metrics: Some(json!({ "distance_km": km })),
            })
            .expect("Failed to create log");
    }

    let logs = store.list_logs(activity.id).expect("Failed to list logs");
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0].text, "Long run");
    assert_eq!(logs[2].text, "Easy pace");
    assert_eq!(logs[0].metrics, Some(json!({ "distance_km": 6.0 })));
}

#[test]
fn test_activity_setup_commits_as_one_unit() {
    let store = Store::open_in_memory().expect("Failed to create store");

    let (activity, goal) = store
        .transaction(|s| {
            let activity = s.create_activity(&NewActivity {
                name: "Cycle to work".to_string(),
                specific: "Ride the commute route".to_string(),
                measurable: "Commutes per week".to_string(),
                timebound: "This quarter".to_string(),
                ..Default::default()
            })?;
            let goal = s.create_goal(&NewGoal {
                activity_id: activity.id,
                target_value: 40,
                target_date: None,
            })?;
            Ok((activity, goal))
        })
        .expect("Setup transaction failed");

    assert!(store.get_activity(activity.id).unwrap().is_some());
    assert!(store.get_goal(goal.id).unwrap().is_some());
}

#[test]
fn test_failed_setup_leaves_no_partial_state() {
    let store = Store::open_in_memory().expect("Failed to create store");

    let result: Result<(), StoreError> = store.transaction(|s| {
        s.create_activity(&NewActivity {
            name: "Half-finished".to_string(),
            specific: "Anything".to_string(),
            measurable: "Anything".to_string(),
            timebound: "Soon".to_string(),
            ..Default::default()
        })?;
        // Goal pointing at a missing activity aborts the whole unit
        s.create_goal(&NewGoal {
            activity_id: 9999,
            target_value: 1,
            target_date: None,
        })?;
        Ok(())
    });

    assert!(matches!(result, Err(StoreError::Query(_))));
    assert_eq!(store.count_activities().unwrap(), 0);
    assert!(store.list_activities().unwrap().is_empty());
}
