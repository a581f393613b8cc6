//! Dataset merger: pre-merge validation followed by a key-based left join of
//! follow-up rows onto base rows.
//!
//! The base dataset defines the output: its header (follow-up-only columns
//! cannot exist after validation), its row order, and its row count. Any
//! error aborts the whole run; no partial dataset is returned.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, info};

use crate::{
    dataset::{Dataset, MergedDataset},
    diagnostics::MergeDiagnostics,
    error::{DatasetRole, MergeResult, MergerError},
    policy::PolicyRegistry,
    record_merge::merge_record,
    validation::{REGISTRATION_NUMBER_COLUMN, is_valid_registration_number},
};

/// Runs every dataset-level check, in order, stopping at the first failure.
pub fn validate_datasets(base: &Dataset, followup: &Dataset) -> MergeResult<()> {
    ensure_not_empty(base, DatasetRole::Base)?;
    ensure_not_empty(followup, DatasetRole::Followup)?;

    if followup.row_count() > base.row_count() {
        return Err(MergerError::FollowupRowCountExceedsBase {
            followup: followup.row_count(),
            base: base.row_count(),
        });
    }

    ensure_key_column(base, DatasetRole::Base)?;
    ensure_key_column(followup, DatasetRole::Followup)?;
    let base_keys = collect_keys(base, DatasetRole::Base)?;
    let followup_keys = collect_keys(followup, DatasetRole::Followup)?;

    let unknown: BTreeSet<&str> = followup_keys
        .iter()
        .filter(|key| !base_keys.contains(*key))
        .copied()
        .collect();
    if !unknown.is_empty() {
        return Err(MergerError::RegistrationNumberMismatch {
            keys: unknown.into_iter().map(str::to_string).collect(),
        });
    }

    let orphan_columns: BTreeSet<&str> = followup
        .headers()
        .iter()
        .filter(|column| !base.has_column(column))
        .map(String::as_str)
        .collect();
    if !orphan_columns.is_empty() {
        return Err(MergerError::MissingColumns {
            columns: orphan_columns.into_iter().map(str::to_string).collect(),
        });
    }

    Ok(())
}

/// Validates both datasets, then merges every base row with its follow-up
/// counterpart (if any) using the policies in `registry`.
pub fn merge_datasets(
    base: &Dataset,
    followup: &Dataset,
    registry: &PolicyRegistry,
    diagnostics: &mut MergeDiagnostics,
) -> MergeResult<MergedDataset> {
    validate_datasets(base, followup)?;
    diagnostics.record_inputs(base.row_count(), followup.row_count());
    info!(
        "[{}] Merging {} base row(s) with {} followup row(s) across {} column(s)",
        diagnostics.label(),
        base.row_count(),
        followup.row_count(),
        base.headers().len()
    );

    let followup_index: HashMap<&str, usize> = followup
        .records()
        .enumerate()
        .map(|(idx, record)| (record.value(REGISTRATION_NUMBER_COLUMN), idx))
        .collect();

    let columns = base.headers();
    let mut rows = Vec::with_capacity(base.row_count());
    for record in base.records() {
        let key = record.value(REGISTRATION_NUMBER_COLUMN);
        let matched = followup_index
            .get(key)
            .and_then(|&idx| followup.record(idx));
        if matched.is_none() {
            debug!("{key}: no followup row, passing base values through");
        }
        rows.push(merge_record(
            columns,
            record,
            matched,
            registry,
            diagnostics,
        )?);
        diagnostics.record_row(matched.is_some());
    }

    Ok(base.with_rows(rows))
}

fn ensure_not_empty(dataset: &Dataset, role: DatasetRole) -> MergeResult<()> {
    if dataset.is_empty() {
        Err(MergerError::EmptyData { dataset: role })
    } else {
        Ok(())
    }
}

fn ensure_key_column(dataset: &Dataset, role: DatasetRole) -> MergeResult<()> {
    if dataset.has_column(REGISTRATION_NUMBER_COLUMN) {
        Ok(())
    } else {
        Err(MergerError::MissingKeyColumn {
            dataset: role,
            column: REGISTRATION_NUMBER_COLUMN.to_string(),
        })
    }
}

fn collect_keys(dataset: &Dataset, role: DatasetRole) -> MergeResult<HashSet<&str>> {
    let mut keys = HashSet::with_capacity(dataset.row_count());
    for record in dataset.records() {
        let key = record.value(REGISTRATION_NUMBER_COLUMN);
        if !is_valid_registration_number(key) {
            return Err(MergerError::InvalidRegistrationNumber {
                dataset: role,
                key: key.to_string(),
            });
        }
        if !keys.insert(key) {
            return Err(MergerError::DuplicateRegistrationNumber {
                dataset: role,
                key: key.to_string(),
            });
        }
    }
    Ok(keys)
}
