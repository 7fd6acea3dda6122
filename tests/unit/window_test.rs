//! Unit tests for range partitioning

use chrono::Duration;
use ocitools::extract::window::{end_of_day, expected_window_count, PartitionError};
use ocitools::extract::partition;

use crate::helpers::day;

fn assert_well_formed(start: chrono::DateTime<chrono::Utc>, end: chrono::DateTime<chrono::Utc>, days: u32) {
    let windows = partition(start, end, days).unwrap();
    assert_eq!(windows.first().unwrap().start, start);
    assert_eq!(windows.last().unwrap().end, end);
    for w in &windows {
        assert!(w.start <= w.end);
        assert!(w.duration() <= Duration::days(i64::from(days)));
    }
    for pair in windows.windows(2) {
        assert_eq!(pair[1].start, pair[0].end + Duration::seconds(1));
    }
    assert_eq!(windows.len(), expected_window_count(start, end, days));
}

#[test]
fn windows_are_contiguous_and_bounded() {
    let start = day(2025, 12, 1);
    assert_well_formed(start, end_of_day(day(2025, 12, 31).date_naive()), 7);
    assert_well_formed(start, end_of_day(day(2026, 3, 31).date_naive()), 14);
    assert_well_formed(start, start + Duration::days(7), 7);
    assert_well_formed(start, start + Duration::seconds(1), 1);
}

#[test]
fn three_weeks_give_three_windows() {
    let windows = partition(
        day(2025, 12, 1),
        end_of_day(day(2025, 12, 21).date_naive()),
        7,
    )
    .unwrap();
    assert_eq!(windows.len(), 3);
    assert_eq!(windows[1].start, day(2025, 12, 8) + Duration::seconds(1));
}

#[test]
fn equal_bounds_give_one_window() {
    let at = day(2025, 6, 1);
    let windows = partition(at, at, 7).unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].start, windows[0].end);
}

#[test]
fn partition_is_idempotent() {
    let start = day(2025, 1, 1);
    let end = end_of_day(day(2025, 2, 28).date_naive());
    assert_eq!(partition(start, end, 7).unwrap(), partition(start, end, 7).unwrap());
}

#[test]
fn reversed_range_is_rejected() {
    let err = partition(day(2025, 2, 1), day(2025, 1, 1), 7).unwrap_err();
    assert!(matches!(err, PartitionError::InvalidRange { .. }));
}

#[test]
fn zero_window_size_is_rejected() {
    assert_eq!(
        partition(day(2025, 1, 1), day(2025, 1, 2), 0).unwrap_err(),
        PartitionError::ZeroWindow
    );
}

#[test]
fn oversized_window_days_do_not_overflow() {
    let start = day(2025, 1, 1);
    let end = end_of_day(day(2025, 1, 31).date_naive());
    let windows = partition(start, end, 100_000_000).unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].start, start);
    assert_eq!(windows[0].end, end);
    assert_eq!(expected_window_count(start, end, u32::MAX), 1);
}
