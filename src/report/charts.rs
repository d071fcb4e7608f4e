//! Chart descriptions built from the frequency table.
//!
//! These types hold everything a renderer needs (labels, values, colors,
//! wedge angles) so the drawing backend never has to look at the data.

use crate::error::SummaryError;
use crate::models::FrequencyTable;

/// Pastel palette, cycled when there are more groups than colors.
pub const PASTEL: [(u8, u8, u8); 10] = [
    (0xA1, 0xC9, 0xF4),
    (0xFF, 0xB4, 0x82),
    (0x8D, 0xE5, 0xA1),
    (0xFF, 0x9F, 0x9B),
    (0xD0, 0xBB, 0xFF),
    (0xDE, 0xBB, 0x9B),
    (0xFA, 0xB0, 0xE4),
    (0xCF, 0xCF, 0xCF),
    (0xFF, 0xFE, 0xA3),
    (0xB9, 0xF2, 0xF0),
];

pub const BAR_CHART_TITLE: &str = "Total Species count for each Phylum";
pub const PIE_CHART_TITLE: &str = "Proportion of Species for each Phylum";

/// One color per group.
pub fn pastel_palette(n: usize) -> Vec<(u8, u8, u8)> {
    PASTEL.iter().copied().cycle().take(n).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: i64,
    pub color: (u8, u8, u8),
}

/// Bar chart of total count per phylum.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
}

impl BarChart {
    /// Bars follow table order.
    pub fn from_table(table: &FrequencyTable) -> Self {
        let bars = table
            .rows
            .iter()
            .zip(pastel_palette(table.len()))
            .map(|(row, color)| Bar {
                label: row.phylum.clone(),
                value: row.total_count,
                color,
            })
            .collect();

        Self {
            title: BAR_CHART_TITLE.to_string(),
            x_label: "Phylum".to_string(),
            y_label: "Count".to_string(),
            bars,
        }
    }

    /// Value range covered by the y axis; always includes zero.
    pub fn value_range(&self) -> (i64, i64) {
        let min = self.bars.iter().map(|b| b.value).min().unwrap_or(0).min(0);
        let max = self.bars.iter().map(|b| b.value).max().unwrap_or(0).max(0);
        (min, max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wedge {
    pub label: String,
    pub color: (u8, u8, u8),
    /// Share of the whole, in percent.
    pub percent: f64,
    /// Angle where the wedge starts, in degrees counter-clockwise from 3 o'clock.
    pub start_deg: f64,
    /// Angular size of the wedge in degrees.
    pub sweep_deg: f64,
}

impl Wedge {
    pub fn end_deg(&self) -> f64 {
        self.start_deg + self.sweep_deg
    }

    pub fn mid_deg(&self) -> f64 {
        self.start_deg + self.sweep_deg / 2.0
    }

    /// Percentage annotation drawn inside the wedge.
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.percent)
    }
}

/// Pie chart of each phylum's share of the total count.
#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub title: String,
    pub start_angle: f64,
    pub wedges: Vec<Wedge>,
}

impl PieChart {
    pub const START_ANGLE: f64 = 90.0;

    /// Wedges follow table order, sweeping counter-clockwise from 90°.
    ///
    /// Fails if any total is negative or all totals are zero.
    pub fn from_table(table: &FrequencyTable) -> Result<Self, SummaryError> {
        if let Some(row) = table.rows.iter().find(|r| r.total_count < 0) {
            return Err(SummaryError::Chart(format!(
                "phylum '{}' has a negative total ({}) and cannot be a pie wedge",
                row.phylum, row.total_count
            )));
        }

        let grand_total = table.grand_total();
        if grand_total == 0 {
            return Err(SummaryError::Chart(
                "all totals are zero, the pie chart would be empty".to_string(),
            ));
        }
        let grand_total = grand_total as f64;

        let mut angle = Self::START_ANGLE;
        let wedges = table
            .rows
            .iter()
            .zip(pastel_palette(table.len()))
            .map(|(row, color)| {
                let fraction = row.total_count as f64 / grand_total;
                let wedge = Wedge {
                    label: row.phylum.clone(),
                    color,
                    percent: fraction * 100.0,
                    start_deg: angle,
                    sweep_deg: fraction * 360.0,
                };
                angle += wedge.sweep_deg;
                wedge
            })
            .collect();

        Ok(Self {
            title: PIE_CHART_TITLE.to_string(),
            start_angle: Self::START_ANGLE,
            wedges,
        })
    }
}

/// Point on a circle in image coordinates (y grows downward).
pub fn polar_point(center: (i32, i32), radius: f64, deg: f64) -> (i32, i32) {
    let rad = deg.to_radians();
    (
        center.0 + (radius * rad.cos()).round() as i32,
        center.1 - (radius * rad.sin()).round() as i32,
    )
}

/// Outline of a wedge as a closed polygon, one arc point per degree or finer.
pub fn wedge_outline(center: (i32, i32), radius: f64, wedge: &Wedge) -> Vec<(i32, i32)> {
    let steps = wedge.sweep_deg.ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);

    points.push(center);
    for i in 0..steps {
        let deg = wedge.start_deg + wedge.sweep_deg * i as f64 / steps as f64;
        points.push(polar_point(center, radius, deg));
    }
    points.push(polar_point(center, radius, wedge.end_deg()));

    points
}
