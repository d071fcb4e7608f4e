//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Taxsum - per-phylum summary of taxonomic count tables
///
/// Reads a CSV of species-level counts with a "phylum" and a "count"
/// column (any case) and writes a frequency table, a bar chart and a pie
/// chart into the output directory:
///   frequency_table_by_phylum.csv, bar_chart.png, pie_chart.png
///
/// Examples:
///   taxsum counts.csv results/
///   taxsum counts.csv results/ --verbose
///   taxsum --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the taxonomic input CSV file
    #[arg(value_name = "INPUT", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Path to the output directory (must already exist)
    #[arg(value_name = "OUTPUT_DIR", required_unless_present = "init_config")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .taxsum.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "TAXSUM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .taxsum.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Input path; empty if unset (validate first).
    pub fn input_path(&self) -> PathBuf {
        self.input.clone().unwrap_or_default()
    }

    /// Output directory; empty if unset (validate first).
    pub fn output_dir(&self) -> PathBuf {
        self.output.clone().unwrap_or_default()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let input = self.input.as_ref().ok_or("Input CSV path is required")?;
        if !input.is_file() {
            return Err(format!("Input file does not exist: {}", input.display()));
        }

        let output = self.output.as_ref().ok_or("Output directory is required")?;
        if !output.exists() {
            return Err(format!(
                "Output directory does not exist: {}",
                output.display()
            ));
        }
        if !output.is_dir() {
            return Err(format!(
                "Output path is not a directory: {}",
                output.display()
            ));
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` comes from the configuration file; `--quiet` wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
