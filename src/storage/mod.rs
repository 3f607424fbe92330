//! Storage module for the database store and configuration.

pub mod config;
pub mod schema;
pub mod store;

pub use config::{ConfigError, TrackerConfig};
pub use store::{RunOutcome, Store, StoreError};
