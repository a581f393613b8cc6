//! Field-level validation run before any merge strategy.
//!
//! Mandatory-field contracts are checked here. Immutable-field conflicts are
//! detected inside the `keep_base_only` strategy itself, after this check
//! has passed.

use std::sync::OnceLock;

use regex::Regex;

use crate::{
    cell,
    error::{DeficientSide, MergeResult, MergerError},
    policy::MandatoryKind,
};

pub const REGISTRATION_NUMBER_COLUMN: &str = "registration_number";

static REGISTRATION_NUMBER_PATTERN: OnceLock<Regex> = OnceLock::new();

fn registration_number_pattern() -> &'static Regex {
    REGISTRATION_NUMBER_PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]{4}/[0-9]{6}$").expect("registration number pattern is valid")
    })
}

/// `YYYY/NNNNNN`, e.g. `2024/000123`.
pub fn is_valid_registration_number(value: &str) -> bool {
    registration_number_pattern().is_match(value)
}

pub fn check_mandatory(
    field: &str,
    key: &str,
    mandatory: MandatoryKind,
    base: &str,
    followup: &str,
) -> MergeResult<()> {
    let side = match mandatory {
        MandatoryKind::Optional => None,
        MandatoryKind::RequiredBoth => {
            match (cell::is_missing(base), cell::is_missing(followup)) {
                (true, true) => Some(DeficientSide::Both),
                (true, false) => Some(DeficientSide::Base),
                (false, true) => Some(DeficientSide::Followup),
                (false, false) => None,
            }
        }
        // The column only exists in the base schema, so any real follow-up
        // value is as much a violation as a missing base value.
        MandatoryKind::RequiredBaseOnly => {
            if cell::is_missing(base) {
                Some(DeficientSide::Base)
            } else if !cell::is_missing(followup) {
                Some(DeficientSide::Followup)
            } else {
                None
            }
        }
    };

    match side {
        Some(side) => Err(MergerError::MandatoryFieldMissing {
            field: field.to_string(),
            key: key.to_string(),
            side,
        }),
        None => Ok(()),
    }
}
