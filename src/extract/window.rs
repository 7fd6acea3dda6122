//! Range partitioning for span-limited audit queries.
//!
//! The audit service refuses queries spanning more than a fixed number of
//! days, so a requested range is cut into consecutive windows that each fit.
//!
//! # Design
//!
//! - `TimeWindow` is closed-inclusive at one-second resolution
//! - the next window starts one second after the previous one ends
//! - the loop is bounded by `expected_window_count`, so a boundary mistake
//!   surfaces as `PartitionError::InvariantViolation` instead of a hang

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;
use thiserror::Error;

/// Gap between the end of one window and the start of the next.
pub fn window_resolution() -> Duration {
    Duration::seconds(1)
}

/// A bounded time sub-range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window. Callers guarantee `start <= end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start <= end, "window start after end");
        Self { start, end }
    }

    /// Length of the window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Check if a timestamp falls within this window (both ends inclusive).
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Errors from range partitioning.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("maximum window size must be at least one day")]
    ZeroWindow,

    /// The partition loop produced a window ending before it starts, or
    /// ran past its precomputed step count.
    #[error("partition invariant violated at {at}: {reason}")]
    InvariantViolation { at: DateTime<Utc>, reason: String },
}

/// Number of windows `partition` produces for the given range.
pub fn expected_window_count(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    max_window_days: u32,
) -> usize {
    if start > end || max_window_days == 0 {
        return 0;
    }
    let total = (end - start).num_seconds();
    // each window consumes its span plus the one-second step
    let per_window = Duration::days(i64::from(max_window_days)).num_seconds()
        + window_resolution().num_seconds();
    (total / per_window) as usize + 1
}

/// Split `[start, end]` into contiguous windows of at most `max_window_days`.
///
/// The first window starts at `start`, the last one ends at `end`, and every
/// following window starts one second after its predecessor ends.
/// `start == end` yields exactly one zero-length window.
pub fn partition(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    max_window_days: u32,
) -> Result<Vec<TimeWindow>, PartitionError> {
    if start > end {
        return Err(PartitionError::InvalidRange { start, end });
    }
    if max_window_days == 0 {
        return Err(PartitionError::ZeroWindow);
    }

    let max_span = Duration::days(i64::from(max_window_days));
    let step_limit = expected_window_count(start, end, max_window_days);
    let mut windows = Vec::with_capacity(step_limit);
    let mut current = start;

    loop {
        // a span reaching past the representable range simply ends at `end`
        let chunk_end = current
            .checked_add_signed(max_span)
            .map_or(end, |t| t.min(end));
        if chunk_end < current {
            return Err(PartitionError::InvariantViolation {
                at: current,
                reason: format!("window end {} precedes its start", chunk_end),
            });
        }
        if windows.len() == step_limit {
            return Err(PartitionError::InvariantViolation {
                at: current,
                reason: format!("exceeded {} expected windows", step_limit),
            });
        }

        windows.push(TimeWindow::new(current, chunk_end));

        if chunk_end == end {
            break;
        }
        current = chunk_end + window_resolution();
    }

    Ok(windows)
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Last second (23:59:59 UTC) of `date`.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - window_resolution()
}
