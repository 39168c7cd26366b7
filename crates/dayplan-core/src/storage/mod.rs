//! Persistence port and its adapters.
//!
//! The recurrence engine and the planner never reach for storage on their
//! own; callers hand them a [`ScheduleStore`]. Two adapters ship here:
//! [`MemoryStore`] for tests and embedding, and [`ScheduleDb`] on SQLite.

mod config;
mod memory;
pub mod migrations;
pub mod schedule_db;

pub use config::{Config, PlannerConfig, RecurrenceConfig};
pub use memory::MemoryStore;
pub use schedule_db::ScheduleDb;

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::error::Result;
use crate::schedule::{NewOccurrence, Occurrence, RecurringDefinition};

/// Storage operations the scheduling core depends on.
pub trait ScheduleStore {
    /// Active recurring definitions belonging to `owner_id`.
    fn list_active_definitions(&self, owner_id: &str) -> Result<Vec<RecurringDefinition>>;

    /// Whether an occurrence of `definition_id` already exists on `date`.
    fn occurrence_exists(&self, owner_id: &str, definition_id: &str, date: NaiveDate) -> Result<bool>;

    /// Persist a new occurrence.
    ///
    /// # Errors
    /// Must return [`DatabaseError::DuplicateOccurrence`](crate::error::DatabaseError::DuplicateOccurrence)
    /// when the request carries a definition id and an occurrence for the
    /// same (owner, definition, date) is already stored.
    fn insert_occurrence(&mut self, request: NewOccurrence) -> Result<Occurrence>;

    /// All occurrences of `owner_id` on `date`, ordered by time of day.
    fn occurrences_on(&self, owner_id: &str, date: NaiveDate) -> Result<Vec<Occurrence>>;
}

/// Returns `~/.config/dayplan[-dev]/` based on DAYPLAN_ENV.
///
/// Set DAYPLAN_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("DAYPLAN_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("dayplan-dev")
    } else {
        base_dir.join("dayplan")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
