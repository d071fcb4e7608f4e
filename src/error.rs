//! Error and warning types for the summarizing pipeline.
//!
//! Fatal conditions are variants of [`SummaryError`]; they abort the run
//! before anything is written. [`DataQualityWarning`] is the non-fatal
//! counterpart: affected rows are dropped and processing continues.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a summarizing run.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// A required column is absent from the header.
    #[error("column '{column}' not found; check the input data file ({})", .path.display())]
    Schema { column: String, path: PathBuf },

    /// A required column matches more than one header once names are lower-cased.
    #[error(
        "column '{column}' appears more than once (ignoring case); check the input data file ({})",
        .path.display()
    )]
    AmbiguousColumn { column: String, path: PathBuf },

    /// The count column holds a value that is not a whole number.
    #[error(
        "the '{column}' column must contain only integers, found '{value}' on line {line}; check the input data file ({})",
        .path.display()
    )]
    DataType {
        column: String,
        path: PathBuf,
        line: u64,
        value: String,
    },

    /// Nothing is left to aggregate after cleaning.
    #[error("no rows with a '{column}' value remain in {}", .path.display())]
    NoData { column: String, path: PathBuf },

    /// A per-phylum total does not fit in 64 bits.
    #[error("total count for phylum '{phylum}' overflows")]
    CountOverflow { phylum: String },

    /// The aggregated totals cannot be drawn.
    #[error("cannot draw chart: {0}")]
    Chart(String),

    /// The input file could not be read as CSV.
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Rendering or encoding an output artifact failed.
    #[error(transparent)]
    Render(#[from] anyhow::Error),
}

impl SummaryError {
    /// Whether the error comes from checking the input data, as opposed to I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SummaryError::Schema { .. }
                | SummaryError::AmbiguousColumn { .. }
                | SummaryError::DataType { .. }
                | SummaryError::NoData { .. }
        )
    }
}

/// Rows dropped from the working set because a required value was missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQualityWarning {
    /// Column holding the missing values.
    pub column: String,
    /// 1-based input line of every dropped row.
    pub lines: Vec<u64>,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "missing values detected in '{}'; {} row(s) with missing values were removed",
            self.column,
            self.lines.len()
        )
    }
}
