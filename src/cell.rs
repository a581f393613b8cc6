//! Helpers for classifying raw cell text.
//!
//! An empty (or whitespace-only) cell means "no value". The literal tokens
//! `null` and `none`, in any case, mean the value was explicitly recorded as
//! null. Both count as missing for mandatory-field checks.

const NULL_TOKENS: &[&str] = &["null", "none"];

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn is_explicit_null(value: &str) -> bool {
    let trimmed = value.trim();
    NULL_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Blank or an explicit null token.
pub fn is_missing(value: &str) -> bool {
    is_blank(value) || is_explicit_null(value)
}
