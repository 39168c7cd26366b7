//! Day timeline arithmetic.
//!
//! This module provides:
//! - Busy interval normalization (sort + merge)
//! - Slot search and free gap listing over a normalized busy set

mod gap;
mod interval;

pub use gap::{find_slot, free_gaps, FreeGap};
pub use interval::{insert_interval, normalize_intervals, BusyInterval};
