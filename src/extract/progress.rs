//! Progress reporting for windowed extraction.
//!
//! Console output goes to stderr so stdout stays usable for piping.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::fetch::{FetchReport, WindowOutcome};
use super::window::TimeWindow;

/// Receives lifecycle notifications from an extraction run.
///
/// All methods default to no-ops so implementors pick what they need.
pub trait FetchProgress {
    /// The range has been partitioned and fetching is about to start.
    fn run_started(&self, _range: &TimeWindow, _total_windows: usize, _max_window_days: u32) {}

    /// A window's first page is about to be requested.
    fn window_started(&self, _index: usize, _total: usize, _window: &TimeWindow) {}

    /// A window finished, successfully or not.
    fn window_finished(&self, _outcome: &WindowOutcome, _total: usize) {}

    /// Every window has been processed.
    fn run_finished(&self, _report: &FetchReport) {}
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuietProgress;

impl FetchProgress for QuietProgress {}

/// Line-oriented progress on stderr.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    /// Records seen so far, across windows
    records: AtomicUsize,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FetchProgress for ConsoleProgress {
    fn run_started(&self, range: &TimeWindow, total_windows: usize, max_window_days: u32) {
        eprintln!("Total time range: {}", range);
        eprintln!(
            "Fetching in {} window{} of max {} day{}...",
            total_windows,
            if total_windows == 1 { "" } else { "s" },
            max_window_days,
            if max_window_days == 1 { "" } else { "s" }
        );
    }

    fn window_started(&self, index: usize, total: usize, window: &TimeWindow) {
        eprint!("  [{}/{}] {} ...", index + 1, total, window);
        let _ = io::stderr().flush();
    }

    fn window_finished(&self, outcome: &WindowOutcome, _total: usize) {
        let seen = self.records.fetch_add(outcome.records, Ordering::SeqCst) + outcome.records;
        match &outcome.failure {
            None => eprintln!(
                " {} event{} ({} total)",
                outcome.records,
                if outcome.records == 1 { "" } else { "s" },
                seen
            ),
            Some(failure) => eprintln!(" skipped ({}: {})", failure.kind, failure.message),
        }
    }

    fn run_finished(&self, report: &FetchReport) {
        eprintln!(
            "Audit fetch complete: {} event{} from {}/{} window{}",
            report.total_records(),
            if report.total_records() == 1 { "" } else { "s" },
            report.succeeded(),
            report.total_windows,
            if report.total_windows == 1 { "" } else { "s" }
        );
    }
}
