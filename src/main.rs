//! Taxsum - per-phylum summary of taxonomic count tables
//!
//! Reads a CSV of species-level counts, validates the "phylum" and
//! "count" columns, and writes a frequency table plus a bar chart and a
//! pie chart of the per-phylum totals.
//!
//! Exit codes:
//!   0 - Success (all three artifacts written)
//!   1 - Invalid arguments, invalid input data, or a runtime error

mod analysis;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod report;
mod summarizer;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use crate::error::SummaryError;
use report::{format_frequency_table, PlottersRenderer};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration decides the default verbosity, so load it first
    let (config, config_note) = load_config(&args);
    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    if let Err(e) = config.chart.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_logging(&args, &config);

    info!("Taxsum v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_note {
        ConfigSource::File(path) => info!("Loaded config from {}", path),
        ConfigSource::Defaults => debug!("No config file found, using defaults"),
        ConfigSource::Fallback(reason) => warn!("Failed to load config: {}", reason),
    }

    if let Err(e) = run(&args, &config) {
        let validation = e.is_validation();
        let e = anyhow::Error::from(e);
        if validation {
            error!("Input validation failed: {:#}", e);
        } else {
            error!("Summary failed: {:#}", e);
        }
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .taxsum.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize chart sizes and fonts.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the summary and print the table and written paths.
fn run(args: &Args, config: &Config) -> Result<(), SummaryError> {
    let start_time = Instant::now();
    let input = args.input_path();
    let output_dir = args.output_dir();

    println!("📥 Reading {}", input.display());

    let renderer = PlottersRenderer::new(config.chart.clone());
    let summary = summarizer::summarize(&input, &output_dir, &renderer)?;

    for warning in &summary.warnings {
        println!("\n⚠️  WARNING: {}.", warning);
    }

    println!();
    println!("{}", format_frequency_table(&summary.table));

    let outputs = &summary.outputs;
    println!("✅ Frequency table saved to {}", outputs.table_file.display());
    println!("✅ Bar chart saved to {}", outputs.bar_chart_file.display());
    println!("✅ Pie chart saved to {}", outputs.pie_chart_file.display());

    debug!("Finished in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Where the configuration came from, logged once logging is up.
enum ConfigSource {
    File(String),
    Defaults,
    Fallback(String),
}

/// Load configuration from file or use defaults.
///
/// An explicit `--config` that fails is an error; a broken default file
/// only falls back to defaults.
fn load_config(args: &Args) -> (Result<Config>, ConfigSource) {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let source = ConfigSource::File(config_path.display().to_string());
        return (Config::load(config_path), source);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => (Ok(config), ConfigSource::File(CONFIG_FILE_NAME.to_string())),
        Ok(None) => (Ok(Config::default()), ConfigSource::Defaults),
        Err(e) => (Ok(Config::default()), ConfigSource::Fallback(format!("{:#}", e))),
    }
}
