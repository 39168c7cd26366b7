//! # dayplan Core Library
//!
//! This library provides the scheduling core of a personal task planner:
//! expansion of recurring task definitions into dated occurrences, and a
//! greedy auto-scheduler that fits free-text task lines into the gaps of a
//! day. The `dayplan` CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Recurrence**: tagged recurrence rules and an engine that decides which
//!   occurrences to create for a date, idempotently
//! - **Scheduler**: duration parsing of candidate lines and interval-based
//!   placement into a day window
//! - **Timeline**: busy interval normalization and free slot search
//! - **Storage**: the [`ScheduleStore`] port, an in-memory adapter, a SQLite
//!   adapter, and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`RecurrenceEngine`]: Recurring definition evaluation
//! - [`IntervalScheduler`]: Candidate placement
//! - [`ScheduleDb`]: Definition and occurrence persistence
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod recurrence;
pub mod schedule;
pub mod scheduler;
pub mod storage;
pub mod timeline;

pub use clock::{format_date, minutes_to_clock, parse_date, ClockTime, MINUTES_PER_DAY};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use recurrence::{FailureKind, GenerationFailure, GenerationReport, RecurrenceEngine, RecurrenceRule};
pub use schedule::{NewOccurrence, Occurrence, Priority, RecurringDefinition};
pub use scheduler::{
    parse_candidate, Candidate, DurationParser, IntervalScheduler, ParsedCandidate, ScheduleResult,
    ScheduledCandidate, SchedulerConfig,
};
pub use storage::{Config, MemoryStore, ScheduleDb, ScheduleStore};
pub use timeline::{find_slot, free_gaps, normalize_intervals, BusyInterval, FreeGap};
