//! Interactive histogram session.
//!
//! Each tunable parameter lives in exactly one [`Observable`]; front ends
//! subscribe to it rather than keeping their own copy. Any change recomputes
//! the histogram synchronously against the current dataset. A failed
//! recomputation (unknown column, zero bins) keeps the last good result.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::{
    dataset::{Dataset, LoadOptions},
    histogram::{
        self, HistogramError, HistogramRequest, HistogramResult, Weighting, auto_range,
        compute_histogram, normalize_range, valid_bin_count,
    },
    observable::Observable,
    render::{self, PlotLabels},
    settings::Settings,
};

pub const DEFAULT_BINS: usize = 20;
pub const DEFAULT_MIN: f64 = 0.0;
pub const DEFAULT_MAX: f64 = 1000.0;

#[derive(Debug)]
pub struct Session {
    dataset: Option<Dataset>,
    value_column: Observable<Option<String>>,
    weighting: Observable<Weighting>,
    bins: Observable<usize>,
    min: Observable<f64>,
    max: Observable<f64>,
    labels: Observable<PlotLabels>,
    auto_range: Observable<bool>,
    result: Observable<Option<HistogramResult>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl Session {
    pub fn new(settings: &Settings) -> Self {
        Self {
            dataset: None,
            value_column: Observable::new(None),
            weighting: Observable::new(Weighting::Unweighted),
            bins: Observable::new(DEFAULT_BINS),
            min: Observable::new(DEFAULT_MIN),
            max: Observable::new(DEFAULT_MAX),
            labels: Observable::new(PlotLabels::from(settings)),
            auto_range: Observable::new(settings.auto_min_max),
            result: Observable::new(None),
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn value_column(&self) -> Option<&str> {
        self.value_column.get().as_deref()
    }

    pub fn weighting(&self) -> &Weighting {
        self.weighting.get()
    }

    pub fn bins(&self) -> usize {
        *self.bins.get()
    }

    pub fn range(&self) -> (f64, f64) {
        (*self.min.get(), *self.max.get())
    }

    pub fn labels(&self) -> &PlotLabels {
        self.labels.get()
    }

    pub fn auto_range_enabled(&self) -> bool {
        *self.auto_range.get()
    }

    pub fn result(&self) -> Option<&HistogramResult> {
        self.result.get().as_ref()
    }

    pub fn observe_bins(&mut self, listener: impl FnMut(&usize) + 'static) {
        self.bins.subscribe(listener);
    }

    pub fn observe_min(&mut self, listener: impl FnMut(&f64) + 'static) {
        self.min.subscribe(listener);
    }

    pub fn observe_max(&mut self, listener: impl FnMut(&f64) + 'static) {
        self.max.subscribe(listener);
    }

    pub fn observe_value_column(&mut self, listener: impl FnMut(&Option<String>) + 'static) {
        self.value_column.subscribe(listener);
    }

    pub fn observe_result(&mut self, listener: impl FnMut(&Option<HistogramResult>) + 'static) {
        self.result.subscribe(listener);
    }

    /// Loads `paths` into a new dataset and swaps it in once complete. The
    /// first selectable column becomes the value column, unweighted.
    pub fn load(&mut self, paths: &[PathBuf], options: &LoadOptions) -> &Dataset {
        let dataset = Dataset::load(paths, options);
        self.replace_dataset(dataset)
    }

    pub fn replace_dataset(&mut self, dataset: Dataset) -> &Dataset {
        info!(
            "Using {} record(s) from {} source(s), {} skipped",
            dataset.len(),
            dataset.sources().len(),
            dataset.skipped().len()
        );
        let first = dataset.selectable_columns().next().map(str::to_string);
        self.dataset = Some(dataset);
        self.result.set(None);
        self.weighting.set(Weighting::Unweighted);
        self.value_column.set(first);
        self.apply_auto_range();
        self.recompute();
        self.dataset.get_or_insert_with(Dataset::new)
    }

    pub fn select_value_column(&mut self, name: &str) -> Result<(), HistogramError> {
        self.require_column(name)?;
        self.value_column.set(Some(name.to_string()));
        self.apply_auto_range();
        self.recompute();
        Ok(())
    }

    pub fn select_weighting(&mut self, weighting: Weighting) -> Result<(), HistogramError> {
        if let Some(name) = weighting.column() {
            self.require_column(name)?;
        }
        self.weighting.set(weighting);
        self.recompute();
        Ok(())
    }

    pub fn set_bins(&mut self, bins: usize) -> Result<(), HistogramError> {
        if !valid_bin_count(bins) {
            return Err(HistogramError::InvalidBinCount);
        }
        self.bins.set(bins);
        self.recompute();
        Ok(())
    }

    /// Text-field entry for the bin count: only plain digit strings are taken.
    pub fn set_bins_text(&mut self, text: &str) -> bool {
        match parse_digits(text) {
            Some(bins) => self.set_bins(bins).is_ok(),
            None => false,
        }
    }

    pub fn set_min(&mut self, min: f64) -> Result<(), HistogramError> {
        self.set_range(min, *self.max.get())
    }

    pub fn set_max(&mut self, max: f64) -> Result<(), HistogramError> {
        self.set_range(*self.min.get(), max)
    }

    /// Stores both bounds, unordered, once they form a usable range; a
    /// rejected pair leaves the previous bounds in place.
    pub fn set_range(&mut self, min: f64, max: f64) -> Result<(), HistogramError> {
        normalize_range(min, max)?;
        self.min.set(min);
        self.max.set(max);
        self.recompute();
        Ok(())
    }

    pub fn set_labels(&mut self, labels: PlotLabels) {
        self.labels.set(labels);
    }

    pub fn set_auto_range(&mut self, enabled: bool) {
        self.auto_range.set(enabled);
    }

    pub fn request(&self) -> Option<HistogramRequest> {
        let column = self.value_column()?;
        Some(HistogramRequest::new(
            column,
            self.weighting().clone(),
            self.bins(),
            self.range(),
        ))
    }

    /// Recomputes from the current parameters. Errors are swallowed and the
    /// previous result stays in place.
    pub fn recompute(&mut self) -> Option<&HistogramResult> {
        let (Some(dataset), Some(request)) = (self.dataset.as_ref(), self.request()) else {
            return self.result();
        };
        match compute_histogram(dataset, &request) {
            Ok(result) => {
                self.result.set(Some(result));
            }
            Err(err) => debug!("Skipping histogram update: {err}"),
        }
        self.result()
    }

    /// CSV text of the current result; fails with
    /// [`HistogramError::NothingToExport`] before the first computation.
    pub fn export_csv(&self) -> anyhow::Result<String> {
        let result = self.result().ok_or(HistogramError::NothingToExport)?;
        histogram::export_csv(result, &result.value_column, result.weighting.label())
    }

    pub fn save_figure(&self, path: &Path) -> anyhow::Result<()> {
        let result = self.result().ok_or(HistogramError::NothingToExport)?;
        render::save_figure(result, self.labels(), path)
    }

    /// Snapshot of the persisted parts of the session.
    pub fn settings(&self) -> Settings {
        let labels = self.labels();
        Settings {
            x_axis_label: labels.x_label.clone(),
            y_axis_label: labels.y_label.clone(),
            title_label: labels.title.clone(),
            auto_min_max: self.auto_range_enabled(),
        }
    }

    fn require_column(&self, name: &str) -> Result<(), HistogramError> {
        match &self.dataset {
            Some(dataset) if dataset.has_column(name) => Ok(()),
            _ => Err(HistogramError::InvalidColumn(name.to_string())),
        }
    }

    fn apply_auto_range(&mut self) {
        if !self.auto_range_enabled() {
            return;
        }
        let (Some(dataset), Some(column)) = (self.dataset.as_ref(), self.value_column.get()) else {
            return;
        };
        match auto_range(dataset, column) {
            Ok(Some((lo, hi))) => {
                debug!("Auto range for '{column}': {lo}..{hi}");
                self.min.set(lo);
                self.max.set(hi);
            }
            Ok(None) => debug!("Column '{column}' has no numeric values; range unchanged"),
            Err(err) => debug!("Auto range skipped: {err}"),
        }
    }
}

fn parse_digits(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
