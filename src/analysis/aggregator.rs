//! Record cleaning and per-phylum aggregation.
//!
//! The steps run in a fixed order: rows with missing counts are dropped
//! first, the remaining counts are checked to be whole numbers, and only
//! then are the records grouped.

use crate::error::{DataQualityWarning, SummaryError};
use crate::models::{CountedRecord, FrequencyRow, FrequencyTable, Record};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the grouping column.
pub const PHYLUM_COLUMN: &str = "phylum";

/// Name of the count column.
pub const COUNT_COLUMN: &str = "count";

/// Remove records without a count.
///
/// Returns the kept records and, if anything was dropped, a warning that
/// lists the affected lines.
pub fn drop_missing_counts(records: Vec<Record>) -> (Vec<Record>, Option<DataQualityWarning>) {
    let (kept, dropped): (Vec<Record>, Vec<Record>) =
        records.into_iter().partition(|r| r.count.is_some());

    let warning = (!dropped.is_empty()).then(|| DataQualityWarning {
        column: COUNT_COLUMN.to_string(),
        lines: dropped.iter().map(|r| r.line).collect(),
    });

    (kept, warning)
}

/// Parse a count cell as a whole number.
///
/// Integral floats such as `10.0` are accepted; fractional, non-finite and
/// non-numeric values are not.
pub fn parse_whole_number(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }

    let f = value.parse::<f64>().ok()?;
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Check that every remaining count is a whole number.
///
/// Must run after [`drop_missing_counts`]; a record that still has no count
/// is reported as a type error.
pub fn parse_counts(records: Vec<Record>, path: &Path) -> Result<Vec<CountedRecord>, SummaryError> {
    records
        .into_iter()
        .map(|record| {
            let raw = record.count.unwrap_or_default();
            match parse_whole_number(&raw) {
                Some(count) => Ok(CountedRecord {
                    line: record.line,
                    phylum: record.phylum,
                    count,
                }),
                None => Err(SummaryError::DataType {
                    column: COUNT_COLUMN.to_string(),
                    path: path.to_path_buf(),
                    line: record.line,
                    value: raw,
                }),
            }
        })
        .collect()
}

/// Remove records that have no phylum; they cannot join any group.
pub fn drop_missing_phyla(
    records: Vec<CountedRecord>,
) -> (Vec<CountedRecord>, Option<DataQualityWarning>) {
    let (kept, dropped): (Vec<CountedRecord>, Vec<CountedRecord>) =
        records.into_iter().partition(|r| r.phylum.is_some());

    let warning = (!dropped.is_empty()).then(|| DataQualityWarning {
        column: PHYLUM_COLUMN.to_string(),
        lines: dropped.iter().map(|r| r.line).collect(),
    });

    (kept, warning)
}

/// Group records by phylum and compute total and mean counts.
///
/// Groups are built in lexicographic phylum order and then stably sorted
/// by total, largest first, so equal totals keep lexicographic order.
pub fn frequency_by_phylum(records: &[CountedRecord]) -> Result<FrequencyTable, SummaryError> {
    let mut groups: BTreeMap<&str, (i64, usize)> = BTreeMap::new();

    for record in records {
        let Some(phylum) = record.phylum.as_deref() else {
            continue;
        };
        let (total, size) = groups.entry(phylum).or_insert((0, 0));
        *total = total
            .checked_add(record.count)
            .ok_or_else(|| SummaryError::CountOverflow {
                phylum: phylum.to_string(),
            })?;
        *size += 1;
    }

    let mut rows: Vec<FrequencyRow> = groups
        .into_iter()
        .map(|(phylum, (total, size))| FrequencyRow {
            phylum: phylum.to_string(),
            total_count: total,
            mean_count: total as f64 / size as f64,
        })
        .collect();

    sort_by_total_desc(&mut rows);

    Ok(FrequencyTable { rows })
}

/// Sort rows by total count, largest first. The sort is stable.
pub fn sort_by_total_desc(rows: &mut [FrequencyRow]) {
    rows.sort_by_key(|r| std::cmp::Reverse(r.total_count));
}
