//! Recurrence engine: turns recurring definitions into dated occurrences.
//!
//! The engine runs once per owner per day. Each definition is evaluated on
//! its own; a failure on one never stops the rest of the batch.
//!
//! # Usage
//! ```rust,ignore
//! use dayplan_core::{MemoryStore, RecurrenceEngine};
//!
//! let mut store = MemoryStore::new();
//! let report = RecurrenceEngine::new().generate_for_owner(&mut store, "alice", today)?;
//! println!("{} occurrence(s) generated", report.count());
//! ```

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CoreError, DatabaseError, Result};
use crate::schedule::{NewOccurrence, Occurrence, RecurringDefinition};
use crate::storage::ScheduleStore;

/// Longest window accepted by [`RecurrenceEngine::upcoming`].
pub const MAX_PREVIEW_DAYS: u32 = 366;

/// Why one definition could not be processed in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rule type unknown or missing a parameter; treated as never matching
    MalformedRule,
    /// Existence check or insert failed in the store
    Storage,
}

/// A per-definition failure, reported alongside the batch result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub definition_id: String,
    pub title: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of generating one owner's occurrences for one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub date: NaiveDate,
    pub created: Vec<Occurrence>,
    /// Due definitions whose occurrence already existed
    pub already_generated: usize,
    pub failures: Vec<GenerationFailure>,
}

impl GenerationReport {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            created: Vec::new(),
            already_generated: 0,
            failures: Vec::new(),
        }
    }

    /// Number of occurrences created.
    pub fn count(&self) -> usize {
        self.created.len()
    }

    fn fail(&mut self, definition: &RecurringDefinition, kind: FailureKind, message: String) {
        warn!(
            definition_id = %definition.id,
            kind = ?kind,
            %message,
            "recurring definition skipped"
        );
        self.failures.push(GenerationFailure {
            definition_id: definition.id.clone(),
            title: definition.title.clone(),
            kind,
            message,
        });
    }
}

/// Stateless evaluator for recurring definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecurrenceEngine;

impl RecurrenceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Whether `definition` fires on `date`: active, not past its end date,
    /// and its rule matches.
    pub fn is_due(&self, definition: &RecurringDefinition, date: NaiveDate) -> bool {
        if !definition.is_active {
            return false;
        }
        if definition.end_date.is_some_and(|end| date > end) {
            return false;
        }
        definition.rule.matches(date, definition.created_at)
    }

    /// Decide whether a new occurrence should be created for `date`.
    ///
    /// `exists(owner_id, definition_id, date)` is consulted only when the
    /// definition is due. Returns `None` when it is not due or the
    /// occurrence already exists.
    pub fn evaluate<F>(&self, definition: &RecurringDefinition, date: NaiveDate, exists: F) -> Option<NewOccurrence>
    where
        F: FnOnce(&str, &str, NaiveDate) -> bool,
    {
        match self.try_evaluate(definition, date, |o, d, day| Ok::<_, std::convert::Infallible>(exists(o, d, day))) {
            Ok(decision) => decision,
            Err(never) => match never {},
        }
    }

    /// Like [`evaluate`](Self::evaluate) with a fallible existence check.
    pub fn try_evaluate<F, E>(
        &self,
        definition: &RecurringDefinition,
        date: NaiveDate,
        exists: F,
    ) -> std::result::Result<Option<NewOccurrence>, E>
    where
        F: FnOnce(&str, &str, NaiveDate) -> std::result::Result<bool, E>,
    {
        if !self.is_due(definition, date) {
            return Ok(None);
        }
        if exists(&definition.owner_id, &definition.id, date)? {
            return Ok(None);
        }
        Ok(Some(NewOccurrence::from_definition(definition, date)))
    }

    /// Dates in `[from, from + days)` on which `definition` is due.
    ///
    /// `days` is capped at [`MAX_PREVIEW_DAYS`].
    pub fn upcoming(&self, definition: &RecurringDefinition, from: NaiveDate, days: u32) -> Vec<NaiveDate> {
        let days = days.min(MAX_PREVIEW_DAYS);
        (0..days)
            .filter_map(|offset| from.checked_add_signed(Duration::days(i64::from(offset))))
            .filter(|date| self.is_due(definition, *date))
            .collect()
    }

    /// Generate occurrences for every active definition of `owner_id`.
    ///
    /// # Errors
    /// Returns an error only when the definitions cannot be listed. Failures
    /// on individual definitions are collected in the report.
    pub fn generate_for_owner<S>(&self, store: &mut S, owner_id: &str, date: NaiveDate) -> Result<GenerationReport>
    where
        S: ScheduleStore + ?Sized,
    {
        let definitions = store.list_active_definitions(owner_id)?;
        Ok(self.generate_batch(store, &definitions, date))
    }

    /// Evaluate `definitions` for `date` and persist what is due.
    pub fn generate_batch<S>(&self, store: &mut S, definitions: &[RecurringDefinition], date: NaiveDate) -> GenerationReport
    where
        S: ScheduleStore + ?Sized,
    {
        let mut report = GenerationReport::new(date);

        for definition in definitions {
            if let crate::recurrence::RecurrenceRule::Unsupported { reason } = &definition.rule {
                report.fail(definition, FailureKind::MalformedRule, reason.clone());
                continue;
            }
            if !self.is_due(definition, date) {
                debug!(definition_id = %definition.id, %date, "not due");
                continue;
            }

            let request = match self.try_evaluate(definition, date, |owner, id, day| {
                store.occurrence_exists(owner, id, day)
            }) {
                Ok(Some(request)) => request,
                Ok(None) => {
                    debug!(definition_id = %definition.id, %date, "already generated");
                    report.already_generated += 1;
                    continue;
                }
                Err(e) => {
                    report.fail(definition, FailureKind::Storage, e.to_string());
                    continue;
                }
            };

            match store.insert_occurrence(request) {
                Ok(occurrence) => {
                    debug!(definition_id = %definition.id, occurrence_id = %occurrence.id, %date, "occurrence generated");
                    report.created.push(occurrence);
                }
                Err(CoreError::Database(DatabaseError::DuplicateOccurrence { .. })) => {
                    // Lost a race with another writer; the row is there.
                    report.already_generated += 1;
                }
                Err(e) => report.fail(definition, FailureKind::Storage, e.to_string()),
            }
        }

        info!(
            %date,
            evaluated = definitions.len(),
            created = report.count(),
            already_generated = report.already_generated,
            failed = report.failures.len(),
            "recurrence generation finished"
        );
        report
    }
}
