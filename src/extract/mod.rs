//! Windowed audit event extraction.
//!
//! Pulls time-ranged audit events from a service that limits the span of a
//! single query and pages its results, and streams them into one JSON array.
//!
//! # Design
//!
//! - `window` partitions the requested range into span-limited windows
//! - `fetch` drains every page of every window as one lazy record stream
//! - `aggregate` filters, serializes and tallies records as they arrive
//! - `Extractor` wires the three together for one run
//!
//! Everything is single-threaded: the aggregator pulls, the fetcher produces
//! on demand.

pub mod aggregate;
pub mod error;
pub mod fetch;
pub mod progress;
pub mod record;
pub mod window;

pub use aggregate::{AggregateStats, EventFilter, FrequencyTally, JsonArrayWriter};
pub use error::ExtractError;
pub use fetch::{
    EventPage, EventSource, FailureKind, FetchError, FetchReport, WindowOutcome, WindowedEvents,
};
pub use progress::{ConsoleProgress, FetchProgress, QuietProgress};
pub use record::{EventRecord, FieldPath, RecordFields};
pub use window::{partition, TimeWindow};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{debug, info};

/// Default file the name tally is written to.
pub const DEFAULT_TALLY_FILE: &str = "allevents.json";

/// Named extractor configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StreamerPreset {
    /// 7-day windows, DD.MM.YY dates, filter optional
    #[default]
    Weekly,
    /// 14-day windows, YYYY-MM-DD dates, filter required
    Fortnightly,
}

impl StreamerPreset {
    pub fn settings(self) -> ExtractorSettings {
        match self {
            StreamerPreset::Weekly => ExtractorSettings {
                preset: self,
                max_window_days: 7,
                date_format: "%d.%m.%y".to_string(),
                require_filter: false,
            },
            StreamerPreset::Fortnightly => ExtractorSettings {
                preset: self,
                max_window_days: 14,
                date_format: "%Y-%m-%d".to_string(),
                require_filter: true,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StreamerPreset::Weekly => "weekly",
            StreamerPreset::Fortnightly => "fortnightly",
        }
    }
}

impl fmt::Display for StreamerPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Window size, date format and filter requirement for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorSettings {
    /// Preset these settings started from
    pub preset: StreamerPreset,
    pub max_window_days: u32,
    /// chrono format string for CLI dates
    pub date_format: String,
    /// Refuse to run without at least one filter pattern
    pub require_filter: bool,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        StreamerPreset::default().settings()
    }
}

impl ExtractorSettings {
    /// Human-readable form of `date_format`, e.g. `DD.MM.YY`.
    pub fn date_format_hint(&self) -> String {
        describe_date_format(&self.date_format)
    }

    fn parse_date(&self, input: &str) -> Result<NaiveDate, ExtractError> {
        NaiveDate::parse_from_str(input.trim(), &self.date_format).map_err(|_| {
            ExtractError::InvalidDate {
                input: input.to_string(),
                expected: self.date_format_hint(),
            }
        })
    }

    /// Parse CLI start and end dates into a range covering both days fully.
    ///
    /// The start is midnight UTC, the end is the last second of its day.
    pub fn date_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), ExtractError> {
        let start = window::start_of_day(self.parse_date(start)?);
        let end = window::end_of_day(self.parse_date(end)?);
        Ok((start, end))
    }
}

/// Render a chrono date format in the DD/MM/YYYY style users expect.
pub fn describe_date_format(format: &str) -> String {
    format
        .replace("%d", "DD")
        .replace("%m", "MM")
        .replace("%Y", "YYYY")
        .replace("%y", "YY")
}

/// Inputs of one extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// Compartment (or tenancy) whose audit events are listed
    pub compartment_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Regex patterns for the event type, tried in order
    pub filter_patterns: Vec<String>,
    pub output_path: PathBuf,
    pub tally_path: PathBuf,
}

impl ExtractionRequest {
    pub fn new(
        compartment_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            compartment_id: compartment_id.into(),
            start,
            end,
            filter_patterns: Vec::new(),
            output_path: output_path.into(),
            tally_path: PathBuf::from(DEFAULT_TALLY_FILE),
        }
    }

    pub fn with_filters(mut self, patterns: Vec<String>) -> Self {
        self.filter_patterns = patterns;
        self
    }

    pub fn with_tally_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tally_path = path.into();
        self
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct ExtractionSummary {
    pub report: FetchReport,
    pub stats: AggregateStats,
    pub tally: FrequencyTally,
    pub output_path: PathBuf,
    pub tally_path: PathBuf,
}

impl ExtractionSummary {
    /// True when at least one window was skipped.
    pub fn is_partial(&self) -> bool {
        self.report.failed() > 0
    }
}

/// Runs extractions against one event source.
pub struct Extractor<'a, S: ?Sized> {
    source: &'a S,
    settings: ExtractorSettings,
    fields: RecordFields,
    progress: &'a dyn FetchProgress,
}

impl<'a, S: EventSource + ?Sized> Extractor<'a, S> {
    pub fn new(source: &'a S, settings: ExtractorSettings) -> Self {
        Self {
            source,
            settings,
            fields: RecordFields::default(),
            progress: &QuietProgress,
        }
    }

    pub fn with_fields(mut self, fields: RecordFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn FetchProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Partition, fetch, filter and write. Fails only on bad input or I/O.
    pub fn run(&self, request: &ExtractionRequest) -> Result<ExtractionSummary, ExtractError> {
        if self.settings.require_filter && request.filter_patterns.is_empty() {
            return Err(ExtractError::FilterRequired {
                preset: self.settings.preset.to_string(),
            });
        }
        let filter = EventFilter::new(&request.filter_patterns)?;

        let windows = partition(request.start, request.end, self.settings.max_window_days)?;
        info!(
            compartment = %request.compartment_id,
            windows = windows.len(),
            max_window_days = self.settings.max_window_days,
            "partitioned range"
        );
        self.progress.run_started(
            &TimeWindow::new(request.start, request.end),
            windows.len(),
            self.settings.max_window_days,
        );

        let output = &request.output_path;
        let file = File::create(output).map_err(|e| ExtractError::io(output, e))?;
        let mut writer =
            JsonArrayWriter::new(BufWriter::new(file)).map_err(|e| ExtractError::io(output, e))?;

        let mut tally = FrequencyTally::new();
        let mut events =
            WindowedEvents::new(self.source, &request.compartment_id, windows, self.progress);
        let stats = aggregate::aggregate(
            events.by_ref(),
            &mut writer,
            &filter,
            &self.fields,
            &mut tally,
        )
        .map_err(|e| ExtractError::io(output, e))?;
        writer.finish().map_err(|e| ExtractError::io(output, e))?;
        debug!(written = stats.written, observed = stats.observed, "output closed");

        tally
            .save(&request.tally_path)
            .map_err(|e| ExtractError::io(&request.tally_path, e))?;
        debug!(names = tally.len(), path = %request.tally_path.display(), "tally saved");

        Ok(ExtractionSummary {
            report: events.into_report(),
            stats,
            tally,
            output_path: request.output_path.clone(),
            tally_path: request.tally_path.clone(),
        })
    }
}
