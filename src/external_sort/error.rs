use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort the current sort phase.
///
/// End of a run and end of a file are ordinary read outcomes and never show
/// up here.
#[derive(Error, Debug)]
pub enum SortError {
    #[error("I/O failure on {} (working file {file_index:?}) after {records_processed} records: {source}", path.display())]
    Io {
        path: PathBuf,
        file_index: Option<usize>,
        records_processed: u64,
        source: std::io::Error,
    },

    #[error("Malformed record in {} at line {line_number}: {value:?}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line_number: u64,
        value: String,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Sort cancelled before merge level {level}")]
    Cancelled { level: usize },

    #[error("Record count mismatch: read {expected} records, output holds {actual}")]
    RecordCountMismatch { expected: u64, actual: u64 },

    /// The run or record bookkeeping of a working file no longer matches what
    /// it holds: `records` left over after it was drained, or taken out of a
    /// file whose counters were already at zero.
    #[error("Run accounting broken on working file {file_index}: {records} records unaccounted for")]
    RunAccounting { file_index: usize, records: u64 },
}

impl SortError {
    pub fn io(
        path: impl Into<PathBuf>,
        file_index: Option<usize>,
        records_processed: u64,
        source: std::io::Error,
    ) -> Self {
        SortError::Io {
            path: path.into(),
            file_index,
            records_processed,
            source,
        }
    }
}

pub type SortResult<T> = std::result::Result<T, SortError>;
