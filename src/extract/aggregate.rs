//! Streaming JSON aggregation of event records.
//!
//! Records are filtered and written to a JSON array one at a time, so memory
//! use does not grow with the number of events. A name tally is updated for
//! every record observed, including those the filter rejects.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

use super::record::{EventRecord, RecordFields};

/// Tally key used when a record has no name field.
pub const UNNAMED_EVENT: &str = "<unnamed>";

/// Incremental writer for a pretty-printed JSON array.
///
/// Produces `[\n`, elements separated by `,\n`, then `\n]\n`. An array with
/// no elements renders as `[\n]\n`.
pub struct JsonArrayWriter<W: Write> {
    inner: W,
    written: usize,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Start the array by writing the opening bracket.
    pub fn new(mut inner: W) -> io::Result<Self> {
        inner.write_all(b"[\n")?;
        Ok(Self { inner, written: 0 })
    }

    /// Append one element.
    pub fn write_element<T: Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        if self.written > 0 {
            self.inner.write_all(b",\n")?;
        }
        serde_json::to_writer_pretty(&mut self.inner, value)?;
        self.written += 1;
        Ok(())
    }

    /// Elements written so far.
    pub fn len(&self) -> usize {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Close the array, flush, and hand back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.written > 0 {
            self.inner.write_all(b"\n")?;
        }
        self.inner.write_all(b"]\n")?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// A filter pattern that failed to compile.
#[derive(Debug, Error)]
#[error("invalid filter pattern '{pattern}': {source}")]
pub struct InvalidPattern {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Ordered list of regex patterns matched against the event type.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    patterns: Vec<Regex>,
}

impl EventFilter {
    /// A filter that accepts everything.
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Compile patterns in order. Fails on the first invalid one.
    pub fn new<I, P>(patterns: I) -> Result<Self, InvalidPattern>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|source| InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Split `spec` on `separator` and compile each non-empty piece.
    pub fn parse(spec: &str, separator: char) -> Result<Self, InvalidPattern> {
        Self::new(split_patterns(spec, separator))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Index of the first pattern found in `event_type`.
    ///
    /// An empty filter accepts every record, reported as `Some(0)`.
    /// A record without a type never matches a non-empty filter.
    pub fn first_match(&self, event_type: Option<&str>) -> Option<usize> {
        if self.patterns.is_empty() {
            return Some(0);
        }
        let event_type = event_type?;
        self.patterns.iter().position(|re| re.is_match(event_type))
    }

    pub fn accepts(&self, event_type: Option<&str>) -> bool {
        self.first_match(event_type).is_some()
    }
}

/// Split a separator-delimited pattern list, dropping empty pieces.
///
/// Pieces are kept verbatim; surrounding whitespace can be part of a pattern.
pub fn split_patterns(spec: &str, separator: char) -> Vec<String> {
    spec.split(separator)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Occurrence count per event name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrequencyTally {
    counts: BTreeMap<String, u64>,
}

impl FrequencyTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str) {
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Distinct names seen.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Entries sorted by descending count, then name.
    pub fn most_common(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self.counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        entries
    }

    /// Persist as a flat JSON object.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = fs::File::create(path)?;
        self.write_to(io::BufWriter::new(file))
    }
}

/// Counters from one aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Records pulled from the stream
    pub observed: usize,
    /// Records that passed the filter and were written
    pub written: usize,
}

impl AggregateStats {
    pub fn filtered_out(&self) -> usize {
        self.observed - self.written
    }
}

/// Drain `records` into `out`, filtering on type and tallying every name.
pub fn aggregate<I, W>(
    records: I,
    out: &mut JsonArrayWriter<W>,
    filter: &EventFilter,
    fields: &RecordFields,
    tally: &mut FrequencyTally,
) -> io::Result<AggregateStats>
where
    I: IntoIterator<Item = EventRecord>,
    W: Write,
{
    let mut stats = AggregateStats::default();

    for record in records {
        stats.observed += 1;

        if filter.accepts(record.field(&fields.type_field)) {
            out.write_element(&record)?;
            stats.written += 1;
        }

        // every observed record is tallied, written or not
        tally.record(record.field(&fields.name_field).unwrap_or(UNNAMED_EVENT));
    }

    Ok(stats)
}
