//! Record merger: one base row plus its optional follow-up row in, one
//! merged row out.

use log::trace;

use crate::{
    dataset::Record,
    diagnostics::MergeDiagnostics,
    error::MergeResult,
    policy::PolicyRegistry,
    validation::{self, REGISTRATION_NUMBER_COLUMN},
};

/// Merges `base` with `followup` column by column, in the order of `columns`
/// (the base header).
///
/// A missing follow-up row, or a follow-up row without a given column, is
/// treated as an empty follow-up cell. Mandatory checks still run for such
/// rows, so an unmatched record fails any `required_both` field.
pub fn merge_record(
    columns: &[String],
    base: Record<'_>,
    followup: Option<Record<'_>>,
    registry: &PolicyRegistry,
    diagnostics: &mut MergeDiagnostics,
) -> MergeResult<Vec<String>> {
    let key = base.value(REGISTRATION_NUMBER_COLUMN);
    let mut merged = Vec::with_capacity(columns.len());

    for field in columns {
        let policy = registry.policy_for(field);
        let base_value = base.value(field);
        let followup_value = followup.map(|row| row.value(field)).unwrap_or("");

        validation::check_mandatory(field, key, policy.mandatory, base_value, followup_value)?;
        let value = policy
            .strategy
            .apply(base_value, followup_value, field, key)?;

        if value != base_value {
            trace!("{key}: '{field}' updated via {}", policy.strategy);
            diagnostics.record_field_change(field);
        }
        merged.push(value);
    }

    Ok(merged)
}
