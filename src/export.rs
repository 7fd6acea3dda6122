//! Flatten an extracted JSON array into CSV.
//!
//! Nested objects become dotted column names (`data.eventName`). Arrays are
//! kept as compact JSON text in a single cell. Columns are the union of all
//! keys in first-seen order; missing values are empty cells.

use csv::Writer;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} must hold an array of objects (or an object with a \"data\" array)", path.display())]
    Shape { path: PathBuf },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Rows and columns written by `export_file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportStats {
    pub rows: usize,
    pub columns: usize,
}

/// A flattened record: column name to cell text, in first-seen order.
pub type FlatRow = Vec<(String, String)>;

/// Flatten one record.
pub fn flatten(record: &Value) -> FlatRow {
    let mut row = Vec::new();
    match record {
        Value::Object(map) => flatten_into(&mut row, "", map),
        other => row.push(("value".to_string(), cell(other))),
    }
    row
}

fn flatten_into(row: &mut FlatRow, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(row, &column, inner),
            other => row.push((column, cell(other))),
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) if map.is_empty() => String::new(),
        other => other.to_string(),
    }
}

/// Records from an extracted file: a top-level array, or the `data` array
/// of a wrapping object.
pub fn records_of(document: Value) -> Option<Vec<Value>> {
    match document {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Write `records` as CSV with a header row. No records writes nothing.
pub fn write_csv<W: Write>(records: &[Value], out: W) -> csv::Result<ExportStats> {
    let rows: Vec<FlatRow> = records.iter().map(flatten).collect();

    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        for (name, _) in row {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
    }

    if columns.is_empty() {
        return Ok(ExportStats {
            rows: 0,
            columns: 0,
        });
    }

    let mut writer = Writer::from_writer(out);
    writer.write_record(&columns)?;
    for row in &rows {
        let cells = columns.iter().map(|column| {
            row.iter()
                .find(|(name, _)| name == column)
                .map_or("", |(_, value)| value.as_str())
        });
        writer.write_record(cells)?;
    }
    writer.flush()?;

    Ok(ExportStats {
        rows: rows.len(),
        columns: columns.len(),
    })
}

/// Convert the JSON file at `input` into a CSV file at `output`.
pub fn export_file(input: &Path, output: &Path) -> Result<ExportStats, ExportError> {
    let file = File::open(input).map_err(|source| ExportError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let document: Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| ExportError::Parse {
            path: input.to_path_buf(),
            source,
        })?;
    let records = records_of(document).ok_or_else(|| ExportError::Shape {
        path: input.to_path_buf(),
    })?;

    let write_err = |source| ExportError::Write {
        path: output.to_path_buf(),
        source,
    };
    let file = File::create(output).map_err(|e| write_err(csv::Error::from(e)))?;
    write_csv(&records, file).map_err(write_err)
}
