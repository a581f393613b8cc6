//! Error taxonomy for the merge engine.
//!
//! Every failure the engine can detect is a [`MergerError`] variant. They are
//! raised at the point of detection and never retried: a run either produces a
//! complete merged dataset or nothing.

use std::fmt;

use thiserror::Error;

/// Which input dataset an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetRole {
    Base,
    Followup,
}

impl fmt::Display for DatasetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetRole::Base => f.write_str("base"),
            DatasetRole::Followup => f.write_str("followup"),
        }
    }
}

/// The side(s) of a merge that failed a mandatory-field contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeficientSide {
    Base,
    Followup,
    Both,
}

impl fmt::Display for DeficientSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeficientSide::Base => f.write_str("base"),
            DeficientSide::Followup => f.write_str("followup"),
            DeficientSide::Both => f.write_str("both"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergerError {
    #[error("The {dataset} dataset has a header but no data rows")]
    EmptyData { dataset: DatasetRole },

    #[error(
        "Followup dataset has {followup} rows but base dataset only has {base} rows; \
         followup cannot reference more records than exist in base"
    )]
    FollowupRowCountExceedsBase { followup: usize, base: usize },

    #[error(
        "Followup dataset contains registration numbers not present in base: {}",
        .keys.join(", ")
    )]
    RegistrationNumberMismatch { keys: Vec<String> },

    #[error(
        "Followup dataset contains columns not present in base: {}",
        .columns.join(", ")
    )]
    MissingColumns { columns: Vec<String> },

    #[error(
        "Mandatory field '{field}' is missing for record {key} (deficient side: {side})"
    )]
    MandatoryFieldMissing {
        field: String,
        key: String,
        side: DeficientSide,
    },

    #[error(
        "Immutable field '{field}' differs for record {key}: base value '{base}' vs followup value '{followup}'"
    )]
    ImmutableFieldConflict {
        field: String,
        key: String,
        base: String,
        followup: String,
    },

    #[error("The {dataset} dataset has no '{column}' column")]
    MissingKeyColumn {
        dataset: DatasetRole,
        column: String,
    },

    #[error("Registration number {key} appears more than once in the {dataset} dataset")]
    DuplicateRegistrationNumber { dataset: DatasetRole, key: String },

    #[error(
        "Registration number '{key}' in the {dataset} dataset does not match the YYYY/NNNNNN format"
    )]
    InvalidRegistrationNumber { dataset: DatasetRole, key: String },

    #[error("Field '{field}' for record {key} holds '{value}', which is not {expected}")]
    MalformedCell {
        field: String,
        key: String,
        value: String,
        expected: &'static str,
    },
}

impl MergerError {
    /// Stable identifier for the error kind, suitable for logs and exit reports.
    pub fn code(&self) -> &'static str {
        match self {
            MergerError::EmptyData { .. } => "empty-data",
            MergerError::FollowupRowCountExceedsBase { .. } => "followup-row-count-exceeds-base",
            MergerError::RegistrationNumberMismatch { .. } => "registration-number-mismatch",
            MergerError::MissingColumns { .. } => "missing-columns",
            MergerError::MandatoryFieldMissing { .. } => "mandatory-field-missing",
            MergerError::ImmutableFieldConflict { .. } => "immutable-field-conflict",
            MergerError::MissingKeyColumn { .. } => "missing-key-column",
            MergerError::DuplicateRegistrationNumber { .. } => "duplicate-registration-number",
            MergerError::InvalidRegistrationNumber { .. } => "invalid-registration-number",
            MergerError::MalformedCell { .. } => "malformed-cell",
        }
    }

    /// True for failures found while validating the datasets as a whole,
    /// before any record was merged.
    pub fn is_pre_merge(&self) -> bool {
        !matches!(
            self,
            MergerError::MandatoryFieldMissing { .. }
                | MergerError::ImmutableFieldConflict { .. }
                | MergerError::MalformedCell { .. }
        )
    }
}

pub type MergeResult<T> = std::result::Result<T, MergerError>;
