//! Figure output for a computed histogram.
//!
//! Both formats are drawn through the same plotters chart, so title, axis
//! labels and ticks appear in `.svg` and `.png` alike. The backend follows
//! the file extension.

use std::path::Path;

use anyhow::{Context, Result, bail};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    data::{format_float, round_to},
    histogram::HistogramResult,
    settings::Settings,
};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const TICK_DECIMALS: u32 = 3;

const BAR_FILL: RGBColor = RGBColor(31, 119, 180);
const BAR_EDGE: RGBColor = RGBColor(20, 80, 125);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotLabels {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl From<&Settings> for PlotLabels {
    fn from(settings: &Settings) -> Self {
        Self {
            title: settings.title_label.clone(),
            x_label: settings.x_axis_label.clone(),
            y_label: settings.y_axis_label.clone(),
        }
    }
}

impl Default for PlotLabels {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureFormat {
    Svg,
    Png,
}

impl FigureFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "svg" => Ok(FigureFormat::Svg),
            "png" => Ok(FigureFormat::Png),
            "" => bail!("Figure path {path:?} has no extension (use .svg or .png)"),
            other => bail!("Unsupported figure format '.{other}' (use .svg or .png)"),
        }
    }
}

pub fn save_figure(result: &HistogramResult, labels: &PlotLabels, path: &Path) -> Result<()> {
    match FigureFormat::from_path(path)? {
        FigureFormat::Svg => {
            let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
            draw_histogram(root, result, labels)
        }
        FigureFormat::Png => {
            let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
            draw_histogram(root, result, labels)
        }
    }
    .with_context(|| format!("Writing figure {path:?}"))
}

/// Vertical extent of the bars; always includes zero.
fn count_range(result: &HistogramResult) -> (f64, f64) {
    let low = result.bins.iter().map(|b| b.count).fold(0.0, f64::min);
    let high = result.max_count();
    if high > low {
        (low, high * 1.05)
    } else {
        (low, low + 1.0)
    }
}

fn tick_label(value: &f64) -> String {
    format_float(round_to(*value, TICK_DECIMALS))
}

fn draw_histogram<DB>(
    root: DrawingArea<DB, Shift>,
    result: &HistogramResult,
    labels: &PlotLabels,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let (x_lo, x_hi) = result.range;
    let (y_lo, y_hi) = count_range(result);
    let mut chart = ChartBuilder::on(&root)
        .caption(labels.title.as_str(), ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(labels.x_label.as_str())
        .y_desc(labels.y_label.as_str())
        .x_label_formatter(&tick_label)
        .y_label_formatter(&tick_label)
        .draw()?;

    chart.draw_series(result.bins.iter().map(|bin| {
        Rectangle::new([(bin.left, 0.0), (bin.right, bin.count)], BAR_FILL.filled())
    }))?;
    chart.draw_series(result.bins.iter().map(|bin| {
        Rectangle::new(
            [(bin.left, 0.0), (bin.right, bin.count)],
            BAR_EDGE.stroke_width(1),
        )
    }))?;

    root.present()?;
    Ok(())
}
