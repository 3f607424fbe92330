//! Domain types for activities, progress logs, and quantitative goals.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A SMART-format activity declaration owned by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Generated surrogate key
    pub id: i64,
    /// Display name
    pub name: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// What exactly will be accomplished
    pub specific: String,
    /// How progress is quantified
    pub measurable: String,
    /// Why the target is realistic
    pub achievable: Option<String>,
    /// Why the activity matters
    pub relevant: Option<String>,
    /// Deadline or time frame
    pub timebound: String,
    /// Accountability buddy to notify about progress
    pub buddy_email: Option<String>,
    /// Whether the activity has been marked done
    pub completed: bool,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last rewritten
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the caller when creating or rewriting an activity.
///
/// Identifier and timestamps are assigned by the store, never by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewActivity {
    pub name: String,
    pub description: Option<String>,
    pub specific: String,
    pub measurable: String,
    pub achievable: Option<String>,
    pub relevant: Option<String>,
    pub timebound: String,
    pub buddy_email: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl NewActivity {
    /// Returns the name of the first required field that is empty, if any.
    ///
    /// `name`, `specific`, `measurable`, and `timebound` must contain
    /// non-whitespace text; the remaining fields are optional.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("name");
        }
        if self.specific.trim().is_empty() {
            return Some("specific");
        }
        if self.measurable.trim().is_empty() {
            return Some("measurable");
        }
        if self.timebound.trim().is_empty() {
            return Some("timebound");
        }
        None
    }
}

/// A timestamped free-text progress note attached to an activity.
///
/// Logs are immutable once written and disappear only when their owning
/// activity is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressLog {
    /// Generated surrogate key
    pub id: i64,
    /// Owning activity
    pub activity_id: i64,
    /// The note itself
    pub text: String,
    /// Optional structured measurements captured with the note
    pub metrics: Option<Value>,
    /// When the note was written
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when recording a progress log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLog {
    pub activity_id: i64,
    pub text: String,
    pub metrics: Option<Value>,
}

/// A quantitative target attached to an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Generated surrogate key
    pub id: i64,
    /// Owning activity
    pub activity_id: i64,
    /// Value to reach
    pub target_value: i64,
    /// Latest reported value
    pub current_value: i64,
    /// Optional deadline
    pub target_date: Option<NaiveDate>,
    /// Derived from the target/current comparison on every progress update
    pub achieved: bool,
    /// When the goal was created
    pub created_at: DateTime<Utc>,
}

impl Goal {
    /// Progress toward the target as a percentage, clamped to 0-100.
    pub fn progress_percent(&self) -> f32 {
        if self.target_value <= 0 {
            return 100.0;
        }
        (self.current_value as f32 / self.target_value as f32 * 100.0).clamp(0.0, 100.0)
    }
}

/// Fields supplied by the caller when creating a goal.
///
/// `current_value` starts at 0 and `achieved` at false; both change only
/// through progress updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub activity_id: i64,
    pub target_value: i64,
    pub target_date: Option<NaiveDate>,
}
