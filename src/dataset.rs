//! CSV loading and column discovery.
//!
//! The whole input is read into memory once. Repeated header names get a
//! `.N` suffix (`count`, `count.1`, ...) and are then lower-cased, so the
//! required columns can be found by exact comparison.

use crate::error::SummaryError;
use crate::models::Record;
use csv::{ReaderBuilder, StringRecord};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cell contents treated as a missing value.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Returns true if a cell holds a missing-value marker.
pub fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value)
}

/// Give every repeated header name a `.N` suffix, in file order.
///
/// Only exact repeats are renamed; names that differ in case stay as they
/// are and are caught later as ambiguous.
fn dedupe_headers<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let names: Vec<&str> = names.into_iter().collect();
    let mut used: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<&str, usize> = HashMap::new();

    names
        .iter()
        .map(|&name| {
            if used.insert(name.to_string()) {
                return name.to_string();
            }
            // skip suffixes that are already header names of their own
            let n = next_suffix.entry(name).or_insert(1);
            loop {
                let col = format!("{}.{}", name, n);
                *n += 1;
                if !names.contains(&col.as_str()) && used.insert(col.clone()) {
                    return col;
                }
            }
        })
        .collect()
}

/// A CSV file held in memory with lower-cased column names.
#[derive(Debug)]
pub struct RawTable {
    /// Source file, used in error messages.
    pub path: PathBuf,
    /// Lower-cased header names in file order.
    pub columns: Vec<String>,
    rows: Vec<(u64, StringRecord)>,
}

impl RawTable {
    /// Read a CSV file with a header row.
    pub fn from_path(path: &Path) -> Result<Self, SummaryError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, path)
    }

    /// Read CSV data from any reader; `path` is only used for reporting.
    pub fn from_reader<R: Read>(reader: R, path: &Path) -> Result<Self, SummaryError> {
        let read_err = |source| SummaryError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = dedupe_headers(rdr.headers().map_err(read_err)?.iter())
            .iter()
            .map(|name| name.to_lowercase())
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(read_err)?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            rows.push((line, record));
        }

        debug!(
            "Loaded {} rows with columns {:?} from {}",
            rows.len(),
            columns,
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            columns,
            rows,
        })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Find the single column whose lower-cased name equals `name` lower-cased.
    pub fn column_index(&self, name: &str) -> Result<usize, SummaryError> {
        let target = name.to_lowercase();
        let matches: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, col)| **col == target)
            .map(|(i, _)| i)
            .collect();

        match matches.as_slice() {
            [index] => Ok(*index),
            [] => Err(SummaryError::Schema {
                column: target,
                path: self.path.clone(),
            }),
            _ => Err(SummaryError::AmbiguousColumn {
                column: target,
                path: self.path.clone(),
            }),
        }
    }

    /// Project every row onto the phylum and count columns.
    ///
    /// Fields past the end of a short row count as missing.
    pub fn records(&self, phylum_idx: usize, count_idx: usize) -> Vec<Record> {
        let cell = |record: &StringRecord, idx: usize| {
            record
                .get(idx)
                .filter(|v| !is_missing(v))
                .map(str::to_string)
        };

        self.rows
            .iter()
            .map(|(line, record)| Record {
                line: *line,
                phylum: cell(record, phylum_idx),
                count: cell(record, count_idx),
            })
            .collect()
    }
}
