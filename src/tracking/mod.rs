//! Activity, progress log, and goal domain model.

pub mod types;

pub use types::{Activity, Goal, NewActivity, NewGoal, NewLog, ProgressLog};
