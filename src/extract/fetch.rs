//! Paginated, window-by-window event fetching.
//!
//! `WindowedEvents` turns a list of windows and an `EventSource` into one lazy
//! stream of records. Only the current page is held in memory.
//!
//! # Failure policy
//!
//! Any error while fetching a window is logged and recorded in the
//! `FetchReport`; the remaining pages of that window are abandoned and the
//! stream moves on to the next window. Records already yielded from earlier
//! pages of a failed window stay yielded.

use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::progress::FetchProgress;
use super::record::EventRecord;
use super::window::TimeWindow;

/// One page of results from the listing endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPage {
    pub records: Vec<Value>,
    /// Continuation token for the next page, `None` on the last page
    pub next_page: Option<String>,
}

impl EventPage {
    /// A final page holding `records`.
    pub fn last(records: Vec<Value>) -> Self {
        Self {
            records,
            next_page: None,
        }
    }

    /// A page followed by another one reachable through `token`.
    pub fn with_next(records: Vec<Value>, token: impl Into<String>) -> Self {
        Self {
            records,
            next_page: Some(token.into()),
        }
    }
}

/// A remote "list events in compartment X between A and B" operation.
pub trait EventSource {
    /// Fetch one page. `page` is `None` for the first page of a window.
    fn list_events(
        &self,
        compartment_id: &str,
        window: &TimeWindow,
        page: Option<&str>,
    ) -> Result<EventPage, FetchError>;
}

impl<S: EventSource + ?Sized> EventSource for &S {
    fn list_events(
        &self,
        compartment_id: &str,
        window: &TimeWindow,
        page: Option<&str>,
    ) -> Result<EventPage, FetchError> {
        (**self).list_events(compartment_id, window, page)
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn list_events(
        &self,
        compartment_id: &str,
        window: &TimeWindow,
        page: Option<&str>,
    ) -> Result<EventPage, FetchError> {
        (**self).list_events(compartment_id, window, page)
    }
}

/// Errors from remote listing calls.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("service returned {status}{}: {message}", code_suffix(.code))]
    Service {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref()
        .map(|c| format!(" ({})", c))
        .unwrap_or_default()
}

/// Coarse failure classes reported per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The service answered with an error status
    RemoteService,
    /// Anything else: transport, decoding, protocol surprises
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::RemoteService => write!(f, "service error"),
            FailureKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Service { .. } => FailureKind::RemoteService,
            FetchError::Transport(_) | FetchError::Decode(_) | FetchError::Unexpected(_) => {
                FailureKind::Unexpected
            }
        }
    }
}

/// Why a window was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// What happened while draining one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOutcome {
    /// Zero-based position of the window in the partition
    pub index: usize,
    pub window: TimeWindow,
    /// Pages successfully fetched
    pub pages: usize,
    /// Records yielded from this window
    pub records: usize,
    pub failure: Option<WindowFailure>,
}

impl WindowOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Per-run fetch statistics, one outcome per processed window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub total_windows: usize,
    pub windows: Vec<WindowOutcome>,
}

impl FetchReport {
    pub fn succeeded(&self) -> usize {
        self.windows.iter().filter(|w| w.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.windows.len() - self.succeeded()
    }

    pub fn total_records(&self) -> usize {
        self.windows.iter().map(|w| w.records).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &WindowOutcome> {
        self.windows.iter().filter(|w| !w.is_success())
    }
}

/// Paging state for the window currently being drained.
#[derive(Debug)]
struct WindowCursor {
    index: usize,
    pages: usize,
    records: usize,
    next_page: Option<String>,
}

impl WindowCursor {
    fn new(index: usize) -> Self {
        Self {
            index,
            pages: 0,
            records: 0,
            next_page: None,
        }
    }

    fn has_more_pages(&self) -> bool {
        self.pages == 0 || self.next_page.is_some()
    }
}

/// Lazy, single-pass stream of records across all windows.
///
/// Windows are processed in the order given; records within a window keep
/// the order the service returned them in.
pub struct WindowedEvents<'a, S: ?Sized> {
    source: &'a S,
    compartment_id: &'a str,
    windows: Vec<TimeWindow>,
    next_window: usize,
    cursor: Option<WindowCursor>,
    buffer: std::vec::IntoIter<Value>,
    pending_failure: Option<FetchError>,
    report: FetchReport,
    progress: &'a dyn FetchProgress,
    finished: bool,
}

impl<'a, S: EventSource + ?Sized> WindowedEvents<'a, S> {
    pub fn new(
        source: &'a S,
        compartment_id: &'a str,
        windows: Vec<TimeWindow>,
        progress: &'a dyn FetchProgress,
    ) -> Self {
        let report = FetchReport {
            total_windows: windows.len(),
            windows: Vec::with_capacity(windows.len()),
        };
        Self {
            source,
            compartment_id,
            windows,
            next_window: 0,
            cursor: None,
            buffer: Vec::new().into_iter(),
            pending_failure: None,
            report,
            progress,
            finished: false,
        }
    }

    /// Outcomes of the windows processed so far.
    pub fn report(&self) -> &FetchReport {
        &self.report
    }

    pub fn into_report(self) -> FetchReport {
        self.report
    }

    fn fetch_page(&mut self, mut cursor: WindowCursor) {
        let window = self.windows[cursor.index];
        let token = cursor.next_page.take();

        match self
            .source
            .list_events(self.compartment_id, &window, token.as_deref())
        {
            Ok(page) => {
                cursor.pages += 1;
                debug!(
                    window = cursor.index + 1,
                    page = cursor.pages,
                    records = page.records.len(),
                    "fetched page"
                );
                let next = page.next_page.filter(|t| !t.is_empty());
                if next.is_some() && next == token {
                    // keep this page's records, then give up on the window
                    self.pending_failure = Some(FetchError::Unexpected(format!(
                        "service repeated continuation token {:?}",
                        token.unwrap_or_default()
                    )));
                } else {
                    cursor.next_page = next;
                }
                self.buffer = page.records.into_iter();
                self.cursor = Some(cursor);
            }
            Err(err) => self.complete_window(cursor, Some(err)),
        }
    }

    fn complete_window(&mut self, cursor: WindowCursor, error: Option<FetchError>) {
        let window = self.windows[cursor.index];
        let failure = match error {
            Some(err) => {
                warn!(
                    window = cursor.index + 1,
                    range = %window,
                    error = %err,
                    "skipping window after fetch failure"
                );
                Some(WindowFailure {
                    kind: err.kind(),
                    message: err.to_string(),
                })
            }
            None => {
                info!(
                    window = cursor.index + 1,
                    records = cursor.records,
                    pages = cursor.pages,
                    "window complete"
                );
                None
            }
        };

        let outcome = WindowOutcome {
            index: cursor.index,
            window,
            pages: cursor.pages,
            records: cursor.records,
            failure,
        };
        self.progress
            .window_finished(&outcome, self.report.total_windows);
        self.report.windows.push(outcome);
    }
}

impl<'a, S: EventSource + ?Sized> Iterator for WindowedEvents<'a, S> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<EventRecord> {
        loop {
            if let Some(value) = self.buffer.next() {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.records += 1;
                }
                return Some(EventRecord::new(value));
            }

            if let Some(cursor) = self.cursor.take() {
                if let Some(err) = self.pending_failure.take() {
                    self.complete_window(cursor, Some(err));
                } else if cursor.has_more_pages() {
                    self.fetch_page(cursor);
                    continue;
                } else {
                    self.complete_window(cursor, None);
                }
            }

            if self.next_window >= self.windows.len() {
                if !self.finished {
                    self.finished = true;
                    self.progress.run_finished(&self.report);
                }
                return None;
            }

            let index = self.next_window;
            self.next_window += 1;
            self.progress
                .window_started(index, self.windows.len(), &self.windows[index]);
            self.fetch_page(WindowCursor::new(index));
        }
    }
}
