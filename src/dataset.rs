//! In-memory tabular datasets.
//!
//! A [`Dataset`] is an ordered header plus ordered rows of text cells. Short
//! rows are padded with empty cells when the dataset is built, so every row
//! has exactly one cell per header column.

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use encoding_rs::Encoding;
use log::debug;

use crate::io_utils;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    positions: HashMap<String, usize>,
}

/// The result of a merge: same header and row order as the base dataset.
pub type MergedDataset = Dataset;

/// A borrowed view of one row, addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    dataset: &'a Dataset,
    values: &'a [String],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.dataset
            .column_index(column)
            .map(|idx| self.values[idx].as_str())
    }

    /// Cell text, or `""` when the column is absent.
    pub fn value(&self, column: &str) -> &'a str {
        self.get(column).unwrap_or("")
    }

    pub fn values(&self) -> &'a [String] {
        self.values
    }
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(headers.len());
        for (idx, name) in headers.iter().enumerate() {
            if positions.insert(name.clone(), idx).is_some() {
                bail!("Duplicate column '{name}' in header");
            }
        }
        let width = headers.len();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, mut row)| {
                if row.len() > width {
                    return Err(anyhow!(
                        "Row {} has {} cells but the header only has {} columns",
                        idx + 2,
                        row.len(),
                        width
                    ));
                }
                row.resize(width, String::new());
                Ok(row)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            headers,
            rows,
            positions,
        })
    }

    /// Convenience constructor from string slices.
    pub fn from_rows<S: AsRef<str>>(headers: &[S], rows: &[Vec<S>]) -> Result<Self> {
        let headers = headers.iter().map(|h| h.as_ref().to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.as_ref().to_string()).collect())
            .collect();
        Self::new(headers, rows)
    }

    pub fn load(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .with_context(|| format!("Reading header of {path:?}"))?;
        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record =
                record.with_context(|| format!("Reading row {} in {:?}", row_idx + 2, path))?;
            rows.push(io_utils::decode_record(&record, encoding)?);
        }
        debug!(
            "Loaded {} row(s) across {} column(s) from {:?}",
            rows.len(),
            headers.len(),
            path
        );
        Self::new(headers, rows).with_context(|| format!("Building dataset from {path:?}"))
    }

    /// Renders the dataset as delimited text, header first.
    pub fn to_csv_bytes(&self, delimiter: u8) -> Result<Vec<u8>> {
        let mut writer = io_utils::csv_writer(Vec::new(), delimiter);
        writer
            .write_record(&self.headers)
            .context("Writing output headers")?;
        for (idx, row) in self.rows.iter().enumerate() {
            writer
                .write_record(row)
                .with_context(|| format!("Writing output row {}", idx + 2))?;
        }
        writer
            .into_inner()
            .map_err(|err| anyhow!("Flushing CSV output: {}", err.error()))
    }

    /// A dataset sharing this one's header, holding `rows`. Rows must already
    /// be header-width.
    pub(crate) fn with_rows(&self, rows: Vec<Vec<String>>) -> Dataset {
        debug_assert!(rows.iter().all(|row| row.len() == self.headers.len()));
        Dataset {
            headers: self.headers.clone(),
            rows,
            positions: self.positions.clone(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn record(&self, idx: usize) -> Option<Record<'_>> {
        self.rows.get(idx).map(|values| Record {
            dataset: self,
            values,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |values| Record {
            dataset: self,
            values,
        })
    }

    /// Every value of `column`, in row order.
    pub fn column_values(&self, column: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }
}
