//! PNG rendering of chart descriptions.
//!
//! The pipeline only talks to [`ChartRenderer`]; [`PlottersRenderer`] is
//! the production implementation on top of the plotters bitmap backend.

use super::charts::{polar_point, wedge_outline, BarChart, PieChart};
use crate::config::ChartConfig;
use anyhow::{anyhow, Context, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle};
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Draws chart descriptions to image files.
pub trait ChartRenderer {
    fn render_bar(&self, chart: &BarChart, path: &Path) -> Result<()>;
    fn render_pie(&self, chart: &PieChart, path: &Path) -> Result<()>;
}

/// Radius factor for wedge labels (outside the pie).
const LABEL_DISTANCE: f64 = 1.1;

/// Radius factor for percentage annotations (inside the wedge).
const PERCENT_DISTANCE: f64 = 0.6;

const FONT_FAMILY: &str = "sans-serif";

/// DejaVu Sans, shipped with the binary (license in assets/fonts).
static FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Register the bundled font under [`FONT_FAMILY`] once per process.
fn ensure_font() -> Result<()> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES)
                .map_err(|_| "bundled font is not a valid TrueType file".to_string())
        })
        .clone()
        .map_err(|e| anyhow!(e))
}

/// Renders charts with plotters.
#[derive(Debug, Clone, Default)]
pub struct PlottersRenderer {
    config: ChartConfig,
}

impl PlottersRenderer {
    pub fn new(config: ChartConfig) -> Self {
        Self { config }
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> RGBColor {
    RGBColor(r, g, b)
}

impl ChartRenderer for PlottersRenderer {
    fn render_bar(&self, chart: &BarChart, path: &Path) -> Result<()> {
        ensure_font()?;
        let cfg = &self.config;
        let root = BitMapBackend::new(path, (cfg.bar_width, cfg.bar_height)).into_drawing_area();
        root.fill(&WHITE)?;

        let n = chart.bars.len() as u32;
        let (min, max) = chart.value_range();
        // headroom so the tallest bar does not touch the frame
        let pad = ((max - min) as f64 * 0.05).max(1.0);
        let y_range = (min as f64 - if min < 0 { pad } else { 0.0 })..(max as f64 + pad);

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, (FONT_FAMILY, cfg.title_font_size))
            .margin(20)
            .x_label_area_size(cfg.label_font_size * 3)
            .y_label_area_size(cfg.label_font_size * 4)
            .build_cartesian_2d((0u32..n).into_segmented(), y_range)?;

        let labels: Vec<&str> = chart.bars.iter().map(|b| b.label.as_str()).collect();
        let x_formatter = |v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).copied().unwrap_or("").to_string(),
            _ => String::new(),
        };

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(chart.bars.len().max(1))
            .x_label_formatter(&x_formatter)
            .x_label_style((FONT_FAMILY, cfg.tick_font_size))
            .y_label_style((FONT_FAMILY, cfg.tick_font_size))
            .x_desc(&chart.x_label)
            .y_desc(&chart.y_label)
            .axis_desc_style((FONT_FAMILY, cfg.label_font_size))
            .draw()?;

        let bar_margin = (cfg.bar_width / (n.max(1) * 10)).max(1);
        ctx.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
            let i = i as u32;
            let mut rect = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), bar.value as f64),
                ],
                rgb(bar.color).filled(),
            );
            rect.set_margin(0, 0, bar_margin, bar_margin);
            rect
        }))?;

        root.present()
            .with_context(|| format!("Failed to write bar chart to {}", path.display()))?;
        debug!("Rendered {} bars to {}", chart.bars.len(), path.display());
        Ok(())
    }

    fn render_pie(&self, chart: &PieChart, path: &Path) -> Result<()> {
        ensure_font()?;
        let cfg = &self.config;
        let root = BitMapBackend::new(path, (cfg.pie_size, cfg.pie_size)).into_drawing_area();
        root.fill(&WHITE)?;

        let root = root.titled(&chart.title, (FONT_FAMILY, cfg.title_font_size))?;
        let (width, height) = root.dim_in_pixel();
        let center = (width as i32 / 2, height as i32 / 2);
        // leave room for the outside labels
        let radius = f64::from(width.min(height)) * 0.35;

        for wedge in chart.wedges.iter().filter(|w| w.sweep_deg > 0.0) {
            root.draw(&Polygon::new(
                wedge_outline(center, radius, wedge),
                rgb(wedge.color).filled(),
            ))?;
        }

        let centered = Pos::new(HPos::Center, VPos::Center);
        let label_style = (FONT_FAMILY, cfg.label_font_size)
            .into_font()
            .color(&BLACK)
            .pos(centered);
        let percent_style = (FONT_FAMILY, cfg.tick_font_size)
            .into_font()
            .color(&BLACK)
            .pos(centered);

        for wedge in &chart.wedges {
            let mid = wedge.mid_deg();
            root.draw(&Text::new(
                wedge.label.clone(),
                polar_point(center, radius * LABEL_DISTANCE, mid),
                label_style.clone(),
            ))?;
            root.draw(&Text::new(
                wedge.percent_label(),
                polar_point(center, radius * PERCENT_DISTANCE, mid),
                percent_style.clone(),
            ))?;
        }

        root.present()
            .with_context(|| format!("Failed to write pie chart to {}", path.display()))?;
        debug!(
            "Rendered {} wedges from {}° to {}",
            chart.wedges.len(),
            chart.start_angle,
            path.display()
        );
        Ok(())
    }
}
