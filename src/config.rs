//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.taxsum.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".taxsum.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Chart rendering settings.
    #[serde(default)]
    pub chart: ChartConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Image sizes (pixels) and font sizes (pixels) for the charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_bar_width")]
    pub bar_width: u32,

    #[serde(default = "default_bar_height")]
    pub bar_height: u32,

    /// Width and height of the square pie chart.
    #[serde(default = "default_pie_size")]
    pub pie_size: u32,

    #[serde(default = "default_title_font_size")]
    pub title_font_size: u32,

    /// Axis descriptions and wedge labels.
    #[serde(default = "default_label_font_size")]
    pub label_font_size: u32,

    /// Tick labels and wedge percentages.
    #[serde(default = "default_tick_font_size")]
    pub tick_font_size: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            bar_width: default_bar_width(),
            bar_height: default_bar_height(),
            pie_size: default_pie_size(),
            title_font_size: default_title_font_size(),
            label_font_size: default_label_font_size(),
            tick_font_size: default_tick_font_size(),
        }
    }
}

fn default_bar_width() -> u32 {
    800
}

fn default_bar_height() -> u32 {
    600
}

fn default_pie_size() -> u32 {
    800
}

fn default_title_font_size() -> u32 {
    22
}

fn default_label_font_size() -> u32 {
    19
}

fn default_tick_font_size() -> u32 {
    16
}

impl ChartConfig {
    /// Reject sizes that cannot produce a readable image.
    pub fn validate(&self) -> Result<(), String> {
        let images = [
            ("bar_width", self.bar_width),
            ("bar_height", self.bar_height),
            ("pie_size", self.pie_size),
        ];
        for (name, value) in images {
            if value < 100 {
                return Err(format!("chart.{} must be at least 100 pixels", name));
            }
        }

        let fonts = [
            ("title_font_size", self.title_font_size),
            ("label_font_size", self.label_font_size),
            ("tick_font_size", self.tick_font_size),
        ];
        for (name, value) in fonts {
            if value == 0 {
                return Err(format!("chart.{} must be at least 1", name));
            }
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Flags only ever switch settings on; an absent flag keeps the file value.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
