//! Per-run merge diagnostics.
//!
//! A [`MergeDiagnostics`] value is created by the caller for one merge run and
//! passed into the dataset merger, which fills it in as rows are merged.

use std::collections::BTreeMap;

use log::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeDiagnostics {
    label: String,
    base_rows: usize,
    followup_rows: usize,
    matched_rows: usize,
    base_only_rows: usize,
    changed_fields: BTreeMap<String, usize>,
}

impl MergeDiagnostics {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn record_inputs(&mut self, base_rows: usize, followup_rows: usize) {
        self.base_rows = base_rows;
        self.followup_rows = followup_rows;
    }

    pub(crate) fn record_row(&mut self, matched: bool) {
        if matched {
            self.matched_rows += 1;
        } else {
            self.base_only_rows += 1;
        }
    }

    pub(crate) fn record_field_change(&mut self, field: &str) {
        *self.changed_fields.entry(field.to_string()).or_insert(0) += 1;
    }

    pub fn base_rows(&self) -> usize {
        self.base_rows
    }

    pub fn followup_rows(&self) -> usize {
        self.followup_rows
    }

    pub fn matched_rows(&self) -> usize {
        self.matched_rows
    }

    pub fn base_only_rows(&self) -> usize {
        self.base_only_rows
    }

    /// Number of merged rows in which `field` differs from its base value.
    pub fn changes_for(&self, field: &str) -> usize {
        self.changed_fields.get(field).copied().unwrap_or(0)
    }

    pub fn changed_fields(&self) -> impl Iterator<Item = (&str, usize)> {
        self.changed_fields
            .iter()
            .map(|(field, count)| (field.as_str(), *count))
    }

    pub fn log_summary(&self) {
        info!(
            "[{}] Merged {} base row(s) with {} followup row(s): {} matched, {} base-only",
            self.label, self.base_rows, self.followup_rows, self.matched_rows, self.base_only_rows
        );
        for (field, count) in &self.changed_fields {
            info!("[{}]   {field}: updated in {count} row(s)", self.label);
        }
    }
}
