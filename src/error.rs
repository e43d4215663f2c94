use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can fail in the library. The driver decides whether a
/// failure aborts the run; library code only propagates.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// `read_at` past the end of a store. Recoverable at the store
    /// boundary even though callers normally treat it as fatal.
    #[error("record {index} out of range, store holds {count} records")]
    OutOfRange { index: u64, count: u64 },

    /// Store file length is not a whole number of records. The file was
    /// written under a different schema, or is not a store at all.
    #[error(
        "{path}: {len} bytes is not a multiple of the {record_size}-byte record size"
    )]
    MisalignedStore {
        path: PathBuf,
        len: u64,
        record_size: u64,
    },

    #[error("column {column} is not an integer: {value:?}")]
    MalformedField { column: usize, value: String },

    #[error("expected at least {expected} columns, found {found}")]
    MissingColumns { expected: usize, found: usize },

    /// A row-level failure with its source file and line attached.
    #[error("{file}:{line}: {source}")]
    SourceRow {
        file: String,
        line: u64,
        source: Box<Error>,
    },

    /// Zone code absent from the rollup lookup. Skipping it would shrink
    /// the aggregated totals, so the whole run fails instead.
    #[error("zone code {code:?} not present in the lookup table")]
    UnknownZone { code: String },

    #[error("unknown table {0:?}")]
    UnknownTable(String),
}
