//! In-memory tabular data assembled from one or more CSV sources.
//!
//! Columns are the union of every loaded header in order of first appearance.
//! Records keep their cells positionally against that union; a record that
//! predates a column simply has no cell for it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    data::{Value, parse_cell},
    io_utils,
};

/// Column that carries each record's source file name.
pub const SOURCE_COLUMN: &str = "file";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    cells: Vec<Option<Value>>,
}

impl Record {
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.cells.get(index).and_then(Option::as_ref)
    }

    fn set(&mut self, index: usize, value: Option<Value>) {
        if self.cells.len() <= index {
            self.cells.resize(index + 1, None);
        }
        self.cells[index] = value;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub tag_source: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            tag_source: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSource {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub non_missing: usize,
    pub numeric: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
    sources: Vec<String>,
    skipped: Vec<SkippedSource>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every file into a fresh dataset. Files that fail to load are
    /// recorded in [`Dataset::skipped`] and loading carries on.
    pub fn load(paths: &[PathBuf], options: &LoadOptions) -> Self {
        let mut dataset = Dataset::new();
        for path in paths {
            match dataset.append_source(path, options) {
                Ok(rows) => info!("Loaded {rows} row(s) from {path:?}"),
                Err(err) => {
                    warn!("Skipping {path:?}: {err:#}");
                    dataset.skipped.push(SkippedSource {
                        path: path.clone(),
                        reason: format!("{err:#}"),
                    });
                }
            }
        }
        dataset
    }

    /// Appends one CSV source. The file is parsed completely before anything
    /// is merged, so a failure leaves the dataset untouched.
    pub fn append_source(&mut self, path: &Path, options: &LoadOptions) -> Result<usize> {
        let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, options.encoding)
            .with_context(|| format!("Reading header row of {path:?}"))?;
        if headers.iter().all(|h| h.trim().is_empty()) {
            bail!("No header row in {path:?}");
        }

        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
            let decoded = io_utils::decode_record(&record, options.encoding)
                .with_context(|| format!("Decoding row {}", row_idx + 2))?;
            rows.push(decoded);
        }

        let source = io_utils::source_name(path);
        let count = rows.len();
        self.append_rows(&headers, rows, options.tag_source.then_some(source.as_str()));
        self.sources.push(source);
        debug!("Dataset now has {} column(s)", self.columns.len());
        Ok(count)
    }

    fn append_rows(&mut self, headers: &[String], rows: Vec<Vec<String>>, source: Option<&str>) {
        let positions = headers
            .iter()
            .map(|h| self.ensure_column(h))
            .collect::<Vec<_>>();
        let source_position = source.map(|_| self.ensure_column(SOURCE_COLUMN));
        for row in rows {
            let mut record = Record::default();
            for (idx, raw) in row.iter().enumerate() {
                if let Some(&position) = positions.get(idx) {
                    record.set(position, parse_cell(raw));
                }
            }
            if let (Some(position), Some(name)) = (source_position, source) {
                record.set(position, Some(Value::Text(name.to_string())));
            }
            self.records.push(record);
        }
    }

    /// Pushes a record built from `(column, value)` pairs, widening the column set as needed.
    pub fn push_record<I, K>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut record = Record::default();
        for (name, value) in cells {
            let position = self.ensure_column(name.as_ref());
            record.set(position, Some(value));
        }
        self.records.push(record);
    }

    fn ensure_column(&mut self, name: &str) -> usize {
        match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                self.columns.len() - 1
            }
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Columns a histogram can be drawn from (everything but the source tag).
    pub fn selectable_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| *c != SOURCE_COLUMN)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn skipped(&self) -> &[SkippedSource] {
        &self.skipped
    }

    /// Iterates the cells of one column, `None` where the record has no value.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = Option<&Value>> {
        self.records.iter().map(move |record| record.get(index))
    }

    pub fn column_summaries(&self) -> Vec<ColumnSummary> {
        self.selectable_columns()
            .filter_map(|name| {
                let index = self.column_index(name)?;
                let mut non_missing = 0;
                let mut numeric = 0;
                for value in self.column_values(index).flatten() {
                    non_missing += 1;
                    if value.as_number().is_some() {
                        numeric += 1;
                    }
                }
                Some(ColumnSummary {
                    name: name.to_string(),
                    non_missing,
                    numeric,
                })
            })
            .collect()
    }
}
