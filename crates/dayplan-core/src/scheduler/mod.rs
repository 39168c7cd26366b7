//! Greedy auto-scheduler for free-text task candidates.
//!
//! This module places candidates into the free time of one day:
//! - Existing occurrences become busy intervals
//! - Candidate lines are parsed for a duration and a clean title
//! - Candidates are placed strictly in the order given, first fit from a
//!   moving cursor, with a break after each placement
//!
//! The result is a preview. Nothing is persisted here; callers turn
//! [`ScheduleResult::scheduled`] into occurrences when the user confirms.

mod candidate;

pub use candidate::{parse_candidate, Candidate, DurationParser, ParsedCandidate};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{minutes_to_clock, ClockTime, MINUTES_PER_DAY};
use crate::error::ValidationError;
use crate::schedule::{NewOccurrence, Occurrence, Priority};
use crate::timeline::{find_slot, free_gaps, insert_interval, normalize_intervals, BusyInterval, FreeGap};

/// Scheduler configuration
///
/// All values are minutes; `day_start`/`day_end` are minutes since midnight
/// bounding the half-open window `[day_start, day_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub day_start: u32,
    pub day_end: u32,
    /// Gap left after each placed candidate
    pub break_minutes: u32,
    /// Duration for candidate lines that name none
    pub default_duration_minutes: u32,
    /// Duration for existing occurrences that have none
    pub default_busy_minutes: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            day_start: 9 * 60,
            day_end: 18 * 60,
            break_minutes: 10,
            default_duration_minutes: 30,
            default_busy_minutes: 30,
        }
    }
}

impl SchedulerConfig {
    /// Check the window and default durations.
    ///
    /// # Errors
    /// Returns a validation error when the window is empty, inverted or runs
    /// past midnight, when the break is longer than a day, or when a default
    /// duration is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.day_start >= self.day_end || self.day_end > MINUTES_PER_DAY {
            return Err(ValidationError::InvalidWindow {
                start: minutes_to_clock(self.day_start),
                end: minutes_to_clock(self.day_end),
            });
        }
        if self.break_minutes > MINUTES_PER_DAY {
            return Err(ValidationError::InvalidValue {
                field: "break_minutes".into(),
                message: format!("must be at most {MINUTES_PER_DAY}"),
            });
        }
        if self.default_duration_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "default_duration_minutes".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.default_busy_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "default_busy_minutes".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn with_window(mut self, day_start: u32, day_end: u32) -> Self {
        self.day_start = day_start;
        self.day_end = day_end;
        self
    }

    pub fn with_break(mut self, minutes: u32) -> Self {
        self.break_minutes = minutes;
        self
    }

    pub fn with_default_duration(mut self, minutes: u32) -> Self {
        self.default_duration_minutes = minutes;
        self
    }

    /// Parser using this configuration's default duration.
    pub fn parser(&self) -> DurationParser {
        DurationParser::new(self.default_duration_minutes)
    }
}

/// A candidate placed on the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledCandidate {
    pub title: String,
    pub duration_minutes: u32,
    pub date: NaiveDate,
    pub start: ClockTime,
    /// `HH:MM`; `24:00` when the slot ends at midnight.
    pub end: String,
}

/// Outcome of one scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub scheduled: Vec<ScheduledCandidate>,
    pub unscheduled: Vec<ParsedCandidate>,
}

impl ScheduleResult {
    pub fn total(&self) -> usize {
        self.scheduled.len() + self.unscheduled.len()
    }

    /// Informational one-liner, e.g. `"2 of 3 candidates scheduled"`.
    pub fn summary(&self) -> String {
        format!("{} of {} candidates scheduled", self.scheduled.len(), self.total())
    }

    /// Creation requests for the scheduled entries, for the caller's
    /// confirmation step.
    pub fn to_new_occurrences(&self, owner_id: &str, category: &str, priority: Priority) -> Vec<NewOccurrence> {
        self.scheduled
            .iter()
            .map(|s| NewOccurrence {
                owner_id: owner_id.to_string(),
                title: s.title.clone(),
                category: category.to_string(),
                priority,
                date: s.date,
                time: Some(s.start),
                duration_minutes: Some(s.duration_minutes),
                definition_id: None,
            })
            .collect()
    }
}

/// Interval-based greedy scheduler.
pub struct IntervalScheduler {
    config: SchedulerConfig,
}

impl IntervalScheduler {
    /// Create a new scheduler with default config
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Busy intervals for a day's existing occurrences.
    ///
    /// Occurrences without a time of day do not block anything. Each lasts
    /// its own duration, or `default_busy_minutes`, clipped at midnight.
    pub fn busy_from_occurrences(&self, occurrences: &[Occurrence]) -> Vec<BusyInterval> {
        occurrences
            .iter()
            .filter_map(|o| {
                let start = o.time?.minutes();
                let minutes = o.duration_minutes.unwrap_or(self.config.default_busy_minutes);
                BusyInterval::starting_at(start, minutes)
            })
            .collect()
    }

    /// Free ranges of the configured window.
    pub fn free_gaps(&self, busy: &[BusyInterval]) -> Vec<FreeGap> {
        free_gaps(&normalize_intervals(busy), self.config.day_start, self.config.day_end)
    }

    /// Place `candidates` in order into the free time of `date`.
    ///
    /// # Errors
    /// Returns a validation error for an empty candidate list, a
    /// zero-minute candidate, or an invalid configuration. Candidates that
    /// do not fit are not an error; they are returned as unscheduled.
    pub fn schedule(
        &self,
        date: NaiveDate,
        busy: &[BusyInterval],
        candidates: &[ParsedCandidate],
    ) -> Result<ScheduleResult, ValidationError> {
        self.config.validate()?;
        if candidates.is_empty() {
            return Err(ValidationError::EmptyCollection("candidates".into()));
        }
        if let Some(zero) = candidates.iter().find(|c| c.duration_minutes == 0) {
            return Err(ValidationError::NonPositiveDuration {
                title: zero.title.clone(),
            });
        }

        let day_end = self.config.day_end;
        let mut merged = normalize_intervals(busy);
        let mut cursor = self.config.day_start;
        let mut result = ScheduleResult {
            scheduled: Vec::new(),
            unscheduled: Vec::new(),
        };

        for candidate in candidates {
            let duration = candidate.duration_minutes;
            // Slots always start before `day_end`, which is at most 1440.
            let placed = find_slot(&merged, cursor, day_end, duration)
                .and_then(|s| Some((ClockTime::from_minutes(s)?, BusyInterval::new(s, s + duration)?)));

            match placed {
                Some((start, interval)) => {
                    debug!(title = %candidate.title, start = %start, duration, "candidate placed");
                    insert_interval(&mut merged, interval);
                    cursor = interval.end.saturating_add(self.config.break_minutes);
                    result.scheduled.push(ScheduledCandidate {
                        title: candidate.title.clone(),
                        duration_minutes: duration,
                        date,
                        start,
                        end: minutes_to_clock(interval.end),
                    });
                }
                None => {
                    debug!(title = %candidate.title, duration, "no slot for candidate");
                    result.unscheduled.push(candidate.clone());
                }
            }
        }

        Ok(result)
    }

    /// Plan `lines` around the occurrences already on `date`.
    ///
    /// # Errors
    /// See [`schedule`](Self::schedule).
    pub fn plan_day<S: AsRef<str>>(
        &self,
        date: NaiveDate,
        occurrences: &[Occurrence],
        lines: &[S],
    ) -> Result<ScheduleResult, ValidationError> {
        let busy = self.busy_from_occurrences(occurrences);
        let candidates = self.config.parser().parse_all(lines);
        self.schedule(date, &busy, &candidates)
    }
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new()
    }
}
