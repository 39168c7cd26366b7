//! Busy intervals in minutes since midnight.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clock::{minutes_to_clock, MINUTES_PER_DAY};

/// Time already committed on a day, as a half-open `[start, end)` range of
/// minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: u32,
    pub end: u32,
}

impl BusyInterval {
    /// Create an interval; `None` when empty or inverted.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Interval starting at `start` lasting `minutes`, clipped at midnight.
    pub fn starting_at(start: u32, minutes: u32) -> Option<Self> {
        Self::new(start, start.saturating_add(minutes).min(MINUTES_PER_DAY))
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the two half-open ranges share any minute.
    pub fn overlaps(&self, other: &BusyInterval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for BusyInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", minutes_to_clock(self.start), minutes_to_clock(self.end))
    }
}

/// Sort and merge overlapping or touching intervals.
///
/// The result is the minimal sorted, pairwise-disjoint cover of the input.
/// Idempotent, and the same for any permutation of the input.
pub fn normalize_intervals(intervals: &[BusyInterval]) -> Vec<BusyInterval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|i| (i.start, i.end));

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(running) if interval.start <= running.end => {
                running.end = running.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Add `interval` to an already-normalized set, keeping it normalized.
pub fn insert_interval(merged: &mut Vec<BusyInterval>, interval: BusyInterval) {
    merged.push(interval);
    *merged = normalize_intervals(merged);
}
