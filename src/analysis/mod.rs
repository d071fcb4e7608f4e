//! Analysis modules.
//!
//! Cleaning, validation and aggregation of the loaded records.

pub mod aggregator;

pub use aggregator::*;
