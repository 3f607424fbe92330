//! SQLite store operations using rusqlite.

use crate::storage::config::TrackerConfig;
use crate::storage::schema::SCHEMA;
use crate::tracking::types::{Activity, Goal, NewActivity, NewGoal, NewLog, ProgressLog};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// SQLite-backed store for activities, progress logs, and goals.
///
/// Owns its connection exclusively. Statements execute synchronously and
/// cannot be cancelled once submitted.
pub struct Store {
    conn: Connection,
}

/// Result of a data-modifying statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Rowid generated by the most recent insert on this connection
    pub last_insert_id: i64,
    /// Number of rows the statement changed
    pub rows_affected: usize,
}

impl Store {
    /// Open or create the store at the configured location.
    pub fn open(config: &TrackerConfig) -> Result<Self, StoreError> {
        let path = config.resolve_database_path();
        Self::open_at(&path)
    }

    /// Open or create a store at the given path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Initialization(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| StoreError::Initialization(e.to_string()))?;

        let store = Self { conn };
        store.initialize()?;

        tracing::info!("Store opened at {}", path.display());

        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Initialization(e.to_string()))?;

        let store = Self { conn };
        store.initialize()?;

        Ok(store)
    }

    /// Enable referential integrity and ensure the schema exists.
    fn initialize(&self) -> Result<(), StoreError> {
        // Foreign keys are off by default in SQLite; cascade deletes need them
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| StoreError::Initialization(e.to_string()))?;

        self.create_schema()?;

        Ok(())
    }

    /// Create all tables and indexes if they do not already exist.
    ///
    /// Safe to call on a database that already carries the schema.
    pub fn create_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(SCHEMA)
            .map_err(|e| StoreError::Initialization(e.to_string()))?;

        tracing::debug!("Database schema ensured");

        Ok(())
    }

    /// Close the store, releasing the underlying connection.
    ///
    /// The connection is consumed even when closing reports an error.
    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| StoreError::Query(e))
    }

    // ========== Query Primitives ==========

    /// Execute a query expected to match at most one row.
    ///
    /// Returns `None` when nothing matches.
    pub fn get<T, P>(
        &self,
        sql: &str,
        params: P,
        map: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>, StoreError>
    where
        P: Params,
    {
        self.conn
            .query_row(sql, params, map)
            .optional()
            .map_err(StoreError::from)
    }

    /// Execute a query and map every matching row, preserving query order.
    pub fn all<T, P>(
        &self,
        sql: &str,
        params: P,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, StoreError>
    where
        P: Params,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    /// Execute a statement that modifies rows.
    pub fn run<P>(&self, sql: &str, params: P) -> Result<RunOutcome, StoreError>
    where
        P: Params,
    {
        let rows_affected = self.conn.execute(sql, params)?;

        Ok(RunOutcome {
            last_insert_id: self.conn.last_insert_rowid(),
            rows_affected,
        })
    }

    // ========== Transactions ==========

    /// Run a unit of work inside a single transaction.
    ///
    /// Commits when the closure returns `Ok`; any error rolls back every
    /// statement the closure issued and is returned unchanged. Transactions
    /// do not nest: a `transaction` call inside the closure fails with
    /// [`StoreError::Query`].
    pub fn transaction<T>(
        &self,
        work: impl FnOnce(&Self) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let value = work(self)?;
        tx.commit()?;

        Ok(value)
    }

    // ========== Activity Operations ==========

    /// Get all activities, newest first.
    pub fn list_activities(&self) -> Result<Vec<Activity>, StoreError> {
        self.all(
            "SELECT id, name, description, specific, measurable, achievable, relevant,
             timebound, buddy_email, completed, created_at, updated_at
             FROM activities ORDER BY created_at DESC, id DESC",
            [],
            parse_activity_row,
        )
    }

    /// Get an activity by ID.
    pub fn get_activity(&self, id: i64) -> Result<Option<Activity>, StoreError> {
        self.get(
            "SELECT id, name, description, specific, measurable, achievable, relevant,
             timebound, buddy_email, completed, created_at, updated_at
             FROM activities WHERE id = ?1",
            params![id],
            parse_activity_row,
        )
    }

    /// Insert a new activity and return the stored record.
    pub fn create_activity(&self, fields: &NewActivity) -> Result<Activity, StoreError> {
        if let Some(field) = fields.missing_field() {
            return Err(StoreError::Validation(format!(
                "Field '{}' must not be empty",
                field
            )));
        }

        let now = Utc::now();
        let outcome = self.run(
            "INSERT INTO activities (name, description, specific, measurable, achievable,
             relevant, timebound, buddy_email, completed, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                fields.name,
                fields.description,
                fields.specific,
                fields.measurable,
                fields.achievable,
                fields.relevant,
                fields.timebound,
                fields.buddy_email,
                fields.completed,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;

        Ok(Activity {
            id: outcome.last_insert_id,
            name: fields.name.clone(),
            description: fields.description.clone(),
            specific: fields.specific.clone(),
            measurable: fields.measurable.clone(),
            achievable: fields.achievable.clone(),
            relevant: fields.relevant.clone(),
            timebound: fields.timebound.clone(),
            buddy_email: fields.buddy_email.clone(),
            completed: fields.completed,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rewrite every mutable field of an activity and advance `updated_at`.
    ///
    /// Returns the number of rows changed: 0 when the id does not exist.
    pub fn update_activity(&self, id: i64, fields: &NewActivity) -> Result<usize, StoreError> {
        if let Some(field) = fields.missing_field() {
            return Err(StoreError::Validation(format!(
                "Field '{}' must not be empty",
                field
            )));
        }

        let now = Utc::now();
        let outcome = self.run(
            "UPDATE activities SET name = ?2, description = ?3, specific = ?4,
             measurable = ?5, achievable = ?6, relevant = ?7, timebound = ?8,
             buddy_email = ?9, completed = ?10, updated_at = ?11 WHERE id = ?1",
            params![
                id,
                fields.name,
                fields.description,
                fields.specific,
                fields.measurable,
                fields.achievable,
                fields.relevant,
                fields.timebound,
                fields.buddy_email,
                fields.completed,
                now.to_rfc3339(),
            ],
        )?;

        Ok(outcome.rows_affected)
    }

    /// Delete an activity together with its logs and goals.
    ///
    /// Returns the number of activity rows removed: 0 when the id does not
    /// exist.
    pub fn delete_activity(&self, id: i64) -> Result<usize, StoreError> {
        let outcome = self.run("DELETE FROM activities WHERE id = ?1", params![id])?;

        Ok(outcome.rows_affected)
    }

    /// Count activities in the store.
    pub fn count_activities(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .get("SELECT COUNT(*) FROM activities", [], |row| row.get(0))?
            .unwrap_or(0);

        Ok(count as usize)
    }

    // ========== Log Operations ==========

    /// Get all progress logs for an activity, newest first.
    pub fn list_logs(&self, activity_id: i64) -> Result<Vec<ProgressLog>, StoreError> {
        self.all(
            "SELECT id, activity_id, text, metrics, created_at
             FROM logs WHERE activity_id = ?1 ORDER BY created_at DESC, id DESC",
            params![activity_id],
            parse_log_row,
        )
    }

    /// Insert a new progress log and return the stored record.
    ///
    /// Fails with [`StoreError::Query`] when `activity_id` does not reference
    /// an existing activity; nothing is inserted in that case.
    pub fn create_log(&self, fields: &NewLog) -> Result<ProgressLog, StoreError> {
        let metrics_json = fields
            .metrics
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Validation(format!("Invalid metrics payload: {}", e)))?;

        let now = Utc::now();
        let outcome = self.run(
            "INSERT INTO logs (activity_id, text, metrics, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                fields.activity_id,
                fields.text,
                metrics_json,
                now.to_rfc3339(),
            ],
        )?;

        Ok(ProgressLog {
            id: outcome.last_insert_id,
            activity_id: fields.activity_id,
            text: fields.text.clone(),
            metrics: fields.metrics.clone(),
            created_at: now,
        })
    }

    /// Count progress logs owned by an activity.
    pub fn count_logs(&self, activity_id: i64) -> Result<usize, StoreError> {
        let count: i64 = self
            .get(
                "SELECT COUNT(*) FROM logs WHERE activity_id = ?1",
                params![activity_id],
                |row| row.get(0),
            )?
            .unwrap_or(0);

        Ok(count as usize)
    }

    // ========== Goal Operations ==========

    /// Get all goals for an activity, newest first.
    pub fn list_goals(&self, activity_id: i64) -> Result<Vec<Goal>, StoreError> {
        self.all(
            "SELECT id, activity_id, target_value, current_value, target_date, achieved,
             created_at FROM goals WHERE activity_id = ?1 ORDER BY created_at DESC, id DESC",
            params![activity_id],
            parse_goal_row,
        )
    }

    /// Get a goal by ID.
    pub fn get_goal(&self, id: i64) -> Result<Option<Goal>, StoreError> {
        self.get(
            "SELECT id, activity_id, target_value, current_value, target_date, achieved,
             created_at FROM goals WHERE id = ?1",
            params![id],
            parse_goal_row,
        )
    }

    /// Insert a new goal and return the stored record.
    ///
    /// Progress starts at 0 and the goal unachieved; both change only through
    /// [`Store::update_goal_progress`].
    pub fn create_goal(&self, fields: &NewGoal) -> Result<Goal, StoreError> {
        let now = Utc::now();
        let outcome = self.run(
            "INSERT INTO goals (activity_id, target_value, current_value, target_date,
             achieved, created_at) VALUES (?1, ?2, 0, ?3, 0, ?4)",
            params![
                fields.activity_id,
                fields.target_value,
                fields.target_date.map(|d| d.to_string()),
                now.to_rfc3339(),
            ],
        )?;

        Ok(Goal {
            id: outcome.last_insert_id,
            activity_id: fields.activity_id,
            target_value: fields.target_value,
            current_value: 0,
            target_date: fields.target_date,
            achieved: false,
            created_at: now,
        })
    }

    /// Record reported progress and recompute the achieved flag.
    ///
    /// The read and the write run inside one transaction, so a concurrent
    /// progress update cannot interleave between them. Fails with
    /// [`StoreError::NotFound`] when the goal does not exist.
    pub fn update_goal_progress(
        &self,
        goal_id: i64,
        current_value: i64,
    ) -> Result<Goal, StoreError> {
        self.transaction(|store| {
            let goal = store
                .get_goal(goal_id)?
                .ok_or_else(|| StoreError::NotFound(format!("Goal {}", goal_id)))?;

            let achieved = current_value >= goal.target_value;
            store.run(
                "UPDATE goals SET current_value = ?2, achieved = ?3 WHERE id = ?1",
                params![goal_id, current_value, achieved],
            )?;

            Ok(Goal {
                current_value,
                achieved,
                ..goal
            })
        })
    }

    /// Count goals owned by an activity.
    pub fn count_goals(&self, activity_id: i64) -> Result<usize, StoreError> {
        let count: i64 = self
            .get(
                "SELECT COUNT(*) FROM goals WHERE activity_id = ?1",
                params![activity_id],
                |row| row.get(0),
            )?
            .unwrap_or(0);

        Ok(count as usize)
    }
}

/// Parse a database row into an Activity.
fn parse_activity_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        specific: row.get(3)?,
        measurable: row.get(4)?,
        achievable: row.get(5)?,
        relevant: row.get(6)?,
        timebound: row.get(7)?,
        buddy_email: row.get(8)?,
        completed: row.get(9)?,
        created_at: parse_timestamp(row, 10)?,
        updated_at: parse_timestamp(row, 11)?,
    })
}

/// Parse a database row into a ProgressLog.
fn parse_log_row(row: &Row<'_>) -> rusqlite::Result<ProgressLog> {
    let metrics_raw: Option<String> = row.get(3)?;
    let metrics = metrics_raw.map(|raw| {
        // Rows written by other tools may hold plain text rather than JSON
        serde_json::from_str(&raw).unwrap_or(Value::String(raw))
    });

    Ok(ProgressLog {
        id: row.get(0)?,
        activity_id: row.get(1)?,
        text: row.get(2)?,
        metrics,
        created_at: parse_timestamp(row, 4)?,
    })
}

/// Parse a database row into a Goal.
fn parse_goal_row(row: &Row<'_>) -> rusqlite::Result<Goal> {
    let target_date_raw: Option<String> = row.get(4)?;
    let target_date = target_date_raw
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
            })
        })
        .transpose()?;

    Ok(Goal {
        id: row.get(0)?,
        activity_id: row.get(1)?,
        target_value: row.get(2)?,
        current_value: row.get(3)?,
        target_date,
        achieved: row.get(5)?,
        created_at: parse_timestamp(row, 6)?,
    })
}

/// Read an RFC 3339 text column as a UTC timestamp.
fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;

    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to initialize store: {0}")]
    Initialization(String),

    #[error("Query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
