//! Weighted histogram engine.
//!
//! [`compute_histogram`] partitions a normalized range into equal-width bins
//! and accumulates per-record weights. Bins are half-open `[left, right)`
//! except the last, which also takes values equal to the range maximum.
//! Records whose value or weight is missing, textual or non-finite are skipped.

use std::fmt;

use anyhow::{Context, Result};
use csv::QuoteStyle;
use itertools::{Itertools, MinMaxResult};
use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::{
    data::{format_float, round_to},
    dataset::Dataset,
};

/// Label used for the weight column when every record counts once.
pub const UNWEIGHTED_LABEL: &str = "None";

/// Upper bound on the bin count; keeps edge and count buffers bounded.
pub const MAX_BINS: usize = 1_000_000;

const EDGE_DECIMALS: u32 = 3;

/// Half-width used to widen a zero-width range; large magnitudes use the
/// relative pad instead so the widened bounds stay distinct.
const ZERO_WIDTH_PAD: f64 = 0.5;
const ZERO_WIDTH_RELATIVE_PAD: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HistogramError {
    #[error("column '{0}' is not present in the loaded data")]
    InvalidColumn(String),
    #[error("bin count must be between 1 and {}", MAX_BINS)]
    InvalidBinCount,
    #[error("range {min}..{max} cannot be split into finite, increasing bin edges")]
    InvalidRange { min: f64, max: f64 },
    #[error("no histogram has been computed yet")]
    NothingToExport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "column")]
pub enum Weighting {
    Unweighted,
    Column(String),
}

impl Weighting {
    /// Parses a user-facing weight selection. Only the exact `None` label or
    /// an empty string selects no weighting; anything else names a column.
    pub fn from_label(label: &str) -> Self {
        if label.is_empty() || label == UNWEIGHTED_LABEL {
            Weighting::Unweighted
        } else {
            Weighting::Column(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Weighting::Unweighted => UNWEIGHTED_LABEL,
            Weighting::Column(name) => name,
        }
    }

    pub fn column(&self) -> Option<&str> {
        match self {
            Weighting::Unweighted => None,
            Weighting::Column(name) => Some(name),
        }
    }
}

impl Default for Weighting {
    fn default() -> Self {
        Weighting::Unweighted
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramRequest {
    pub value_column: String,
    pub weighting: Weighting,
    pub bins: usize,
    /// Raw `(min, max)`; need not be ordered.
    pub range: (f64, f64),
}

impl HistogramRequest {
    pub fn new(
        value_column: impl Into<String>,
        weighting: Weighting,
        bins: usize,
        range: (f64, f64),
    ) -> Self {
        Self {
            value_column: value_column.into(),
            weighting,
            bins,
            range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub left: f64,
    pub right: f64,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramResult {
    pub value_column: String,
    pub weighting: Weighting,
    pub range: (f64, f64),
    pub bins: Vec<Bin>,
    /// Records that landed in a bin.
    pub included: usize,
    /// Records with a usable value outside the range.
    pub out_of_range: usize,
    /// Records with a missing or non-numeric value or weight.
    pub skipped: usize,
}

impl HistogramResult {
    pub fn edges(&self) -> Vec<f64> {
        let mut edges = self.bins.iter().map(|b| b.left).collect::<Vec<_>>();
        if let Some(last) = self.bins.last() {
            edges.push(last.right);
        }
        edges
    }

    pub fn total(&self) -> f64 {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn max_count(&self) -> f64 {
        self.bins.iter().map(|b| b.count).fold(0.0, f64::max)
    }
}

/// Orders the bounds and widens a zero-width range by half a unit each way
/// (more for values too large for half a unit to register). The resulting
/// width must itself be finite.
pub fn normalize_range(min: f64, max: f64) -> Result<(f64, f64), HistogramError> {
    let invalid = || HistogramError::InvalidRange { min, max };
    if !min.is_finite() || !max.is_finite() {
        return Err(invalid());
    }
    let (mut low, mut high) = if min > max { (max, min) } else { (min, max) };
    if low == high {
        let pad = ZERO_WIDTH_PAD.max(low.abs() * ZERO_WIDTH_RELATIVE_PAD);
        (low, high) = (low - pad, high + pad);
    }
    if !(high - low).is_finite() || low >= high {
        return Err(invalid());
    }
    Ok((low, high))
}

/// Evenly spaced edges; the last edge is exactly `max`. Fails when the range
/// is too narrow for `bins` distinct edges at `f64` precision.
fn bin_edges(min: f64, max: f64, bins: usize) -> Result<Vec<f64>, HistogramError> {
    let span = max - min;
    let edges = (0..=bins)
        .map(|i| {
            if i == bins {
                max
            } else {
                min + span * (i as f64 / bins as f64)
            }
        })
        .collect::<Vec<_>>();
    if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(HistogramError::InvalidRange { min, max });
    }
    Ok(edges)
}

/// Whether `bins` is an acceptable bin count.
pub fn valid_bin_count(bins: usize) -> bool {
    (1..=MAX_BINS).contains(&bins)
}

fn bin_index(value: f64, edges: &[f64]) -> Option<usize> {
    let bins = edges.len() - 1;
    let (min, max) = (edges[0], edges[bins]);
    if value < min || value > max {
        return None;
    }
    let mut index = (((value - min) / (max - min)) * bins as f64) as usize;
    if index >= bins {
        index = bins - 1;
    }
    // Correct for floating point drift against the materialized edges.
    if value < edges[index] {
        index -= 1;
    } else if index + 1 < bins && value >= edges[index + 1] {
        index += 1;
    }
    Some(index)
}

fn require_column(dataset: &Dataset, name: &str) -> Result<usize, HistogramError> {
    dataset
        .column_index(name)
        .ok_or_else(|| HistogramError::InvalidColumn(name.to_string()))
}

pub fn compute_histogram(
    dataset: &Dataset,
    request: &HistogramRequest,
) -> Result<HistogramResult, HistogramError> {
    let value_index = require_column(dataset, &request.value_column)?;
    let weight_index = request
        .weighting
        .column()
        .map(|name| require_column(dataset, name))
        .transpose()?;
    if !valid_bin_count(request.bins) {
        return Err(HistogramError::InvalidBinCount);
    }
    let (min, max) = normalize_range(request.range.0, request.range.1)?;
    let edges = bin_edges(min, max, request.bins)?;

    let mut counts = vec![0.0; request.bins];
    let mut included = 0;
    let mut out_of_range = 0;
    let mut skipped = 0;
    for record in dataset.records() {
        let Some(value) = record.get(value_index).and_then(|v| v.as_finite()) else {
            skipped += 1;
            continue;
        };
        let weight = match weight_index {
            None => 1.0,
            Some(idx) => match record.get(idx).and_then(|v| v.as_finite()) {
                Some(w) => w,
                None => {
                    skipped += 1;
                    continue;
                }
            },
        };
        match bin_index(value, &edges) {
            Some(idx) => {
                counts[idx] += weight;
                included += 1;
            }
            None => out_of_range += 1,
        }
    }
    debug!(
        "Histogram of '{}' weighted by {}: {included} in range, {out_of_range} outside, {skipped} skipped",
        request.value_column, request.weighting
    );

    let bins = edges
        .windows(2)
        .zip(counts)
        .map(|(pair, count)| Bin {
            left: pair[0],
            right: pair[1],
            count,
        })
        .collect();
    Ok(HistogramResult {
        value_column: request.value_column.clone(),
        weighting: request.weighting.clone(),
        range: (min, max),
        bins,
        included,
        out_of_range,
        skipped,
    })
}

/// Smallest and largest finite numeric value of `column`, or `None` when the
/// column holds no numbers.
pub fn auto_range(dataset: &Dataset, column: &str) -> Result<Option<(f64, f64)>, HistogramError> {
    let index = require_column(dataset, column)?;
    let extents = dataset
        .column_values(index)
        .filter_map(|value| value.and_then(|v| v.as_finite()))
        .minmax_by(|a, b| a.total_cmp(b));
    Ok(match extents {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
    })
}

/// Renders bins as CSV: a quoted header naming the columns, then
/// `left,right,count` rows with edges rounded to three decimals.
pub fn export_csv(
    result: &HistogramResult,
    value_column: &str,
    weight_column: &str,
) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new());
    writer.write_record([
        format!("{value_column}_left"),
        format!("{value_column}_right"),
        format!("{value_column} weighted by {weight_column}"),
    ])?;
    for bin in &result.bins {
        writer.write_record([
            format_float(round_to(bin.left, EDGE_DECIMALS)),
            format_float(round_to(bin.right, EDGE_DECIMALS)),
            format_float(bin.count),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| err.into_error())
        .context("Flushing CSV export")?;
    String::from_utf8(bytes).context("CSV export is not valid UTF-8")
}
