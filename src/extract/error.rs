//! Errors that end an extraction run.
//!
//! Per-window fetch failures are not here: they are recovered inside
//! `WindowedEvents` and only show up in the `FetchReport`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::aggregate::InvalidPattern;
use super::window::PartitionError;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("date '{input}' is not in the required {expected} format")]
    InvalidDate { input: String, expected: String },

    #[error("invalid time range: {0}")]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    InvalidPattern(#[from] InvalidPattern),

    #[error("the {preset} preset requires at least one event filter pattern")]
    FilterRequired { preset: String },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExtractError {
    /// Whether the error was caused by bad input rather than a failing run.
    ///
    /// Configuration errors are raised before any remote call is made.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            ExtractError::Io { .. }
                | ExtractError::Partition(PartitionError::InvariantViolation { .. })
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExtractError::Io {
            path: path.into(),
            source,
        }
    }
}
