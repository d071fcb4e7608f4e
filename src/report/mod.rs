//! Report generation modules.
//!
//! The frequency table is written as CSV and echoed to the console; the
//! charts are described in [`charts`] and drawn by a [`ChartRenderer`].

pub mod charts;
pub mod render;
pub mod table;

pub use charts::{BarChart, PieChart};
pub use render::{ChartRenderer, PlottersRenderer};
pub use table::{format_frequency_table, write_frequency_csv};
