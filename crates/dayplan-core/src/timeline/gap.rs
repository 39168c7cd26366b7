//! Free-time search between busy intervals.
//!
//! Both functions expect a set produced by
//! [`normalize_intervals`](super::normalize_intervals): sorted ascending and
//! pairwise disjoint.

use serde::{Deserialize, Serialize};

use super::BusyInterval;

/// A free `[start, end)` range inside a day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeGap {
    pub start: u32,
    pub end: u32,
}

impl FreeGap {
    pub fn duration_minutes(&self) -> u32 {
        self.end - self.start
    }
}

/// Earliest start at or after `search_from` where `duration` minutes fit
/// before `day_end` without touching busy time.
///
/// Walks the busy set with a cursor: a gap before the next interval is taken
/// if it is long enough, otherwise the cursor jumps past that interval.
/// Intervals that begin at or after `day_end` cannot bound a slot, so the
/// scan stops there and the window end decides.
pub fn find_slot(merged: &[BusyInterval], search_from: u32, day_end: u32, duration: u32) -> Option<u32> {
    let mut cursor = search_from;

    for interval in merged {
        if interval.start >= day_end {
            break;
        }
        if cursor.saturating_add(duration) <= interval.start {
            return Some(cursor);
        }
        cursor = cursor.max(interval.end);
    }

    (cursor.saturating_add(duration) <= day_end).then_some(cursor)
}

/// Free ranges of `[day_start, day_end)` not covered by `merged`.
pub fn free_gaps(merged: &[BusyInterval], day_start: u32, day_end: u32) -> Vec<FreeGap> {
    let mut gaps = Vec::new();
    let mut last_end = day_start;

    for interval in merged {
        // Skip intervals that end before our current position
        if interval.end <= last_end {
            continue;
        }
        if interval.start >= day_end {
            break;
        }
        if interval.start > last_end {
            gaps.push(FreeGap {
                start: last_end,
                end: interval.start,
            });
        }
        last_end = interval.end.min(day_end);
    }

    if last_end < day_end {
        gaps.push(FreeGap {
            start: last_end,
            end: day_end,
        });
    }

    gaps
}
