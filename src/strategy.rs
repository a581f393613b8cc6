//! Merge strategy catalog.
//!
//! Each [`MergeStrategyKind`] reconciles one base cell with the matching
//! follow-up cell. All strategies are pure: `(base, followup, field, key)`
//! in, merged cell text (or a [`MergerError`]) out. An empty cell or an
//! explicit null token (`null`, `none`) on either side means "no value".

use std::{fmt, str::FromStr};

use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    cell,
    codec::{self, JsonObject},
    error::{MergeResult, MergerError},
};

pub const ORIGINAL_LABEL: &str = "**Original Response:**";
pub const FOLLOWUP_LABEL: &str = "**Current Followup:**";

const TRUE_TEXT: &str = "True";
const FALSE_TEXT: &str = "False";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategyKind {
    KeepBaseOnly,
    ConcatenateWithLabels,
    JsonObjectUnion,
    JsonObjectUnionWithListMerge,
    JsonListUnion,
    BooleanOr,
    MonotonicTrueOnFollowup,
    AuthoritativeBasePriorityBoolean,
    LatestDateMax,
    ValidatedStatusTransition,
    PreferFollowupDate,
}

impl MergeStrategyKind {
    pub const ALL: [MergeStrategyKind; 11] = [
        MergeStrategyKind::KeepBaseOnly,
        MergeStrategyKind::ConcatenateWithLabels,
        MergeStrategyKind::JsonObjectUnion,
        MergeStrategyKind::JsonObjectUnionWithListMerge,
        MergeStrategyKind::JsonListUnion,
        MergeStrategyKind::BooleanOr,
        MergeStrategyKind::MonotonicTrueOnFollowup,
        MergeStrategyKind::AuthoritativeBasePriorityBoolean,
        MergeStrategyKind::LatestDateMax,
        MergeStrategyKind::ValidatedStatusTransition,
        MergeStrategyKind::PreferFollowupDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategyKind::KeepBaseOnly => "keep_base_only",
            MergeStrategyKind::ConcatenateWithLabels => "concatenate_with_labels",
            MergeStrategyKind::JsonObjectUnion => "json_object_union",
            MergeStrategyKind::JsonObjectUnionWithListMerge => "json_object_union_with_list_merge",
            MergeStrategyKind::JsonListUnion => "json_list_union",
            MergeStrategyKind::BooleanOr => "boolean_or",
            MergeStrategyKind::MonotonicTrueOnFollowup => "monotonic_true_on_followup",
            MergeStrategyKind::AuthoritativeBasePriorityBoolean => {
                "authoritative_base_priority_boolean"
            }
            MergeStrategyKind::LatestDateMax => "latest_date_max",
            MergeStrategyKind::ValidatedStatusTransition => "validated_status_transition",
            MergeStrategyKind::PreferFollowupDate => "prefer_followup_date",
        }
    }

    /// One-line summary used when listing policies.
    pub fn describe(&self) -> &'static str {
        match self {
            MergeStrategyKind::KeepBaseOnly => "base value; conflicting followup is an error",
            MergeStrategyKind::ConcatenateWithLabels => "both values with provenance labels",
            MergeStrategyKind::JsonObjectUnion => "object union, followup wins on collision",
            MergeStrategyKind::JsonObjectUnionWithListMerge => {
                "object union, list values unioned and sorted"
            }
            MergeStrategyKind::JsonListUnion => "list union without duplicates",
            MergeStrategyKind::BooleanOr => "logical OR",
            MergeStrategyKind::MonotonicTrueOnFollowup => "true once either side is true",
            MergeStrategyKind::AuthoritativeBasePriorityBoolean => "base true is final, else OR",
            MergeStrategyKind::LatestDateMax => "later of the two dates",
            MergeStrategyKind::ValidatedStatusTransition => "followup status when present",
            MergeStrategyKind::PreferFollowupDate => "followup date when present",
        }
    }

    pub fn apply(&self, base: &str, followup: &str, field: &str, key: &str) -> MergeResult<String> {
        match self {
            MergeStrategyKind::KeepBaseOnly => keep_base_only(base, followup, field, key),
            MergeStrategyKind::ConcatenateWithLabels => Ok(concatenate_with_labels(base, followup)),
            MergeStrategyKind::JsonObjectUnion => {
                json_object_union(base, followup, field, key, false)
            }
            MergeStrategyKind::JsonObjectUnionWithListMerge => {
                json_object_union(base, followup, field, key, true)
            }
            MergeStrategyKind::JsonListUnion => json_list_union(base, followup, field, key),
            MergeStrategyKind::BooleanOr | MergeStrategyKind::MonotonicTrueOnFollowup => {
                Ok(boolean_or(base, followup))
            }
            MergeStrategyKind::AuthoritativeBasePriorityBoolean => {
                Ok(authoritative_base_priority_boolean(base, followup))
            }
            MergeStrategyKind::LatestDateMax => latest_date_max(base, followup, field, key),
            MergeStrategyKind::ValidatedStatusTransition
            | MergeStrategyKind::PreferFollowupDate => Ok(prefer_followup(base, followup)),
        }
    }
}

impl fmt::Display for MergeStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        MergeStrategyKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| anyhow!("Unknown merge strategy '{s}'"))
    }
}

fn same_value(base: &str, followup: &str) -> bool {
    base.trim() == followup.trim()
}

fn keep_base_only(base: &str, followup: &str, field: &str, key: &str) -> MergeResult<String> {
    if cell::is_missing(followup) || same_value(base, followup) || cell::is_missing(base) {
        return Ok(base.to_string());
    }
    Err(MergerError::ImmutableFieldConflict {
        field: field.to_string(),
        key: key.to_string(),
        base: base.to_string(),
        followup: followup.to_string(),
    })
}

fn concatenate_with_labels(base: &str, followup: &str) -> String {
    match (cell::is_missing(base), cell::is_missing(followup)) {
        (false, false) if !same_value(base, followup) => {
            format!("{ORIGINAL_LABEL} {base}\n\n{FOLLOWUP_LABEL} {followup}")
        }
        (true, false) => followup.to_string(),
        _ => base.to_string(),
    }
}

fn malformed(field: &str, key: &str, value: &str, expected: &'static str) -> MergerError {
    MergerError::MalformedCell {
        field: field.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn object_cell(text: &str, field: &str, key: &str) -> MergeResult<JsonObject> {
    codec::decode_object(text)
        .map(Option::unwrap_or_default)
        .map_err(|_| malformed(field, key, text, "a JSON object"))
}

fn list_cell(text: &str, field: &str, key: &str) -> MergeResult<Vec<Value>> {
    codec::decode_list(text)
        .map(Option::unwrap_or_default)
        .map_err(|_| malformed(field, key, text, "a JSON list"))
}

/// Base items first, then follow-up items, keeping only the first copy of
/// each exact duplicate.
fn union_lists(base: &[Value], followup: &[Value], sort_strings: bool) -> Vec<Value> {
    let mut merged: Vec<Value> = Vec::with_capacity(base.len() + followup.len());
    for item in base.iter().chain(followup) {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    if sort_strings && merged.iter().all(Value::is_string) {
        merged = merged
            .iter()
            .filter_map(Value::as_str)
            .sorted()
            .dedup()
            .map(Value::from)
            .collect();
    }
    merged
}

/// Reuses a side's original cell text when the merge left that side's value
/// unchanged, so untouched cells keep their formatting and key order.
fn reuse_or_encode<T: PartialEq>(
    merged: &T,
    base: (&str, &T),
    followup: (&str, &T),
    encode: impl FnOnce(&T) -> String,
) -> String {
    let encoded = encode(merged);
    if encoded.is_empty() {
        encoded
    } else if merged == base.1 {
        base.0.to_string()
    } else if merged == followup.1 {
        followup.0.to_string()
    } else {
        encoded
    }
}

fn json_object_union(
    base: &str,
    followup: &str,
    field: &str,
    key: &str,
    sort_list_strings: bool,
) -> MergeResult<String> {
    let base_object = object_cell(base, field, key)?;
    let updates = object_cell(followup, field, key)?;
    let mut merged = base_object.clone();
    for (name, incoming) in &updates {
        let combined = match (merged.get(name), incoming) {
            (Some(Value::Array(existing)), Value::Array(extra)) => {
                Value::Array(union_lists(existing, extra, sort_list_strings))
            }
            (_, other) => other.clone(),
        };
        merged.insert(name.clone(), combined);
    }
    Ok(reuse_or_encode(
        &merged,
        (base, &base_object),
        (followup, &updates),
        codec::encode_object,
    ))
}

fn json_list_union(base: &str, followup: &str, field: &str, key: &str) -> MergeResult<String> {
    let base_items = list_cell(base, field, key)?;
    let followup_items = list_cell(followup, field, key)?;
    let merged = union_lists(&base_items, &followup_items, false);
    Ok(reuse_or_encode(
        &merged,
        (base, &base_items),
        (followup, &followup_items),
        |items| codec::encode_list(items),
    ))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1"
    )
}

fn encode_flag(value: bool) -> String {
    let text = if value { TRUE_TEXT } else { FALSE_TEXT };
    text.to_string()
}

fn boolean_or(base: &str, followup: &str) -> String {
    if cell::is_missing(base) && cell::is_missing(followup) {
        return base.to_string();
    }
    encode_flag(parse_flag(base) || parse_flag(followup))
}

fn authoritative_base_priority_boolean(base: &str, followup: &str) -> String {
    if parse_flag(base) {
        return encode_flag(true);
    }
    boolean_or(base, followup)
}

fn parse_date(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

fn latest_date_max(base: &str, followup: &str, field: &str, key: &str) -> MergeResult<String> {
    if cell::is_missing(followup) {
        return Ok(base.to_string());
    }
    if cell::is_missing(base) {
        return Ok(followup.to_string());
    }
    let base_date = parse_date(base).ok_or_else(|| malformed(field, key, base, "an ISO date"))?;
    let followup_date =
        parse_date(followup).ok_or_else(|| malformed(field, key, followup, "an ISO date"))?;
    if followup_date > base_date {
        Ok(followup.to_string())
    } else {
        Ok(base.to_string())
    }
}

// Status transitions are not checked against a progression graph; the
// follow-up status is always taken as the more current one.
fn prefer_followup(base: &str, followup: &str) -> String {
    if cell::is_missing(followup) {
        base.to_string()
    } else {
        followup.to_string()
    }
}
