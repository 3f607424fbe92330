//! SmartTrack - SMART Activity Tracking Library
//!
//! Persistence layer for a self-hosted SMART activity tracker. Stores
//! activity declarations, timestamped progress logs, and quantitative
//! goals in a local SQLite database, and keeps goal achievement state
//! consistent with reported progress.

pub mod storage;
pub mod tracking;

// Re-export commonly used types
pub use storage::store::{RunOutcome, Store, StoreError};
pub use tracking::types::{Activity, Goal, NewActivity, NewGoal, NewLog, ProgressLog};
