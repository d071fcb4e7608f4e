//! Data models for the taxonomic summary.
//!
//! Input rows move through three shapes: [`Record`] as read from the file,
//! [`CountedRecord`] once the count is validated, and finally one
//! [`FrequencyRow`] per phylum inside a [`FrequencyTable`].

use serde::Serialize;

/// One input row, reduced to the two columns the summary needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based line in the input file.
    pub line: u64,
    /// Phylum label, `None` when the cell holds a missing-value marker.
    pub phylum: Option<String>,
    /// Raw count text, `None` when the cell holds a missing-value marker.
    pub count: Option<String>,
}

/// A record whose count has been checked to be a whole number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountedRecord {
    pub line: u64,
    pub phylum: Option<String>,
    pub count: i64,
}

/// Aggregated counts for one phylum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    /// Phylum label, unique within a table.
    pub phylum: String,
    /// Sum of all counts for the phylum.
    #[serde(rename = "TotalSpeciesCountPerPhylum")]
    pub total_count: i64,
    /// Arithmetic mean of the counts for the phylum.
    #[serde(rename = "MeanSpeciesCountPerPhylum")]
    pub mean_count: f64,
}

/// Per-phylum frequency table, ordered by total count (largest first).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable {
    pub rows: Vec<FrequencyRow>,
}

impl FrequencyTable {
    /// Number of distinct phyla.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of every phylum total.
    pub fn grand_total(&self) -> i128 {
        self.rows.iter().map(|r| i128::from(r.total_count)).sum()
    }

    /// Looks up the row for a phylum.
    #[cfg(test)]
    pub fn get(&self, phylum: &str) -> Option<&FrequencyRow> {
        self.rows.iter().find(|r| r.phylum == phylum)
    }
}
