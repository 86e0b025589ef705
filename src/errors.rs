use std::io;

use thiserror::Error;

use crate::types::{BatchId, FieldName, WorkerId};

/// Error type for stream decoding, worker, configuration, and cache failures.
///
/// Validation findings are never errors; they are collected into the report.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The feed stream could not be read or is not valid UTF-8.
    #[error("input stream could not be decoded: {0}")]
    Decode(String),
    /// The header lacks a column every run needs.
    #[error("feed header is missing the required '{0}' column")]
    MissingColumn(FieldName),
    /// A worker failed while validating a batch.
    #[error("worker {worker} failed on batch {batch}: {reason}")]
    Worker {
        /// Worker that reported the failure.
        worker: WorkerId,
        /// Batch being validated.
        batch: BatchId,
        /// Panic message or transport failure.
        reason: String,
    },
    /// Invalid configuration or dictionary input.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Correction cache table could not be encoded or decoded.
    #[error("correction cache failure: {0}")]
    Cache(String),
    /// Filesystem failure outside the feed stream.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<csv::Error> for ValidationError {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(err) => ValidationError::Decode(format!("read failed: {err}")),
            kind => ValidationError::Decode(describe_csv_kind(&kind)),
        }
    }
}

fn describe_csv_kind(kind: &csv::ErrorKind) -> String {
    match kind {
        csv::ErrorKind::Utf8 { pos, err } => match pos {
            Some(pos) => format!("invalid UTF-8 on line {}: {err}", pos.line()),
            None => format!("invalid UTF-8: {err}"),
        },
        other => format!("{other:?}"),
    }
}
