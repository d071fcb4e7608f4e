//! Frequency table output: CSV file and console table.

use crate::analysis::PHYLUM_COLUMN;
use crate::models::FrequencyTable;
use anyhow::{Context, Result};
use std::io::Write;

/// Column headers of the frequency table, in output order.
pub const TABLE_HEADERS: [&str; 3] = [
    PHYLUM_COLUMN,
    "TotalSpeciesCountPerPhylum",
    "MeanSpeciesCountPerPhylum",
];

/// Write the table as CSV with a header row and no index column.
pub fn write_frequency_csv<W: Write>(table: &FrequencyTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    // serialize() only emits a header once it sees a first row
    if table.is_empty() {
        wtr.write_record(TABLE_HEADERS)?;
    }
    for row in &table.rows {
        wtr.serialize(row)
            .with_context(|| format!("Failed to write row for phylum '{}'", row.phylum))?;
    }

    wtr.flush().context("Failed to flush frequency table")?;
    Ok(())
}

/// Format a mean so whole values keep one decimal (`15.0`).
pub fn format_mean(mean: f64) -> String {
    if mean.is_finite() && mean.fract() == 0.0 {
        format!("{:.1}", mean)
    } else {
        mean.to_string()
    }
}

/// Render the table as aligned plain text for the console.
pub fn format_frequency_table(table: &FrequencyTable) -> String {
    let cells: Vec<[String; 3]> = table
        .rows
        .iter()
        .map(|r| {
            [
                r.phylum.clone(),
                r.total_count.to_string(),
                format_mean(r.mean_count),
            ]
        })
        .collect();

    let mut widths = TABLE_HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = format!("Frequency Table by {}:\n\n", PHYLUM_COLUMN);
    output.push_str(&format!(
        "{:<w0$}  {:>w1$}  {:>w2$}\n",
        TABLE_HEADERS[0],
        TABLE_HEADERS[1],
        TABLE_HEADERS[2],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
    ));
    for [phylum, total, mean] in &cells {
        output.push_str(&format!(
            "{:<w0$}  {:>w1$}  {:>w2$}\n",
            phylum,
            total,
            mean,
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        ));
    }

    output
}
