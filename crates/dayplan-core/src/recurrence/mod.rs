//! Recurring-task expansion.
//!
//! This module provides:
//! - [`RecurrenceRule`], the tagged rule type and its date-match predicate
//! - [`RecurrenceEngine`], which decides which occurrences to create for a
//!   date and runs owner-wide batches against a [`ScheduleStore`](crate::storage::ScheduleStore)

mod engine;
mod rule;

pub use engine::{
    FailureKind, GenerationFailure, GenerationReport, RecurrenceEngine, MAX_PREVIEW_DAYS,
};
pub use rule::RecurrenceRule;
