//! Input discovery by naming convention.
//!
//! Scrape runs are stored as timestamped directories (`20240315_091500`),
//! each holding CSV exports named `<prefix>_<timestamp>.csv`. These helpers
//! resolve "the newest run" and "the newest file with a prefix" so the merge
//! can be pointed at a directory instead of a file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y%m%d_%H%M%S",
    "%Y%m%d_%H%M",
    "%Y-%m-%d_%H-%M-%S",
    "%Y-%m-%dT%H-%M-%S",
];
const DATA_EXTENSIONS: &[&str] = &["csv", "tsv"];

pub const OUTPUT_PREFIX: &str = "merged";

fn parse_run_timestamp(name: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(name, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(name, "%Y%m%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn read_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    fs::read_dir(dir)
        .with_context(|| format!("Listing directory {dir:?}"))?
        .map(|entry| {
            entry
                .map(|e| e.path())
                .with_context(|| format!("Reading entry in {dir:?}"))
        })
        .collect()
}

/// Newest subdirectory of `root` whose name is a run timestamp.
pub fn latest_run_dir(root: &Path) -> Result<Option<PathBuf>> {
    let latest = read_entries(root)?
        .into_iter()
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            let stamp = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(parse_run_timestamp)?;
            Some((stamp, path))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, path)| path);
    Ok(latest)
}

/// Newest data file in `dir` named `<prefix>_<suffix>.csv` (or `.tsv`).
/// Files are ordered by the timestamp parsed from the suffix; files whose
/// suffix is not a timestamp rank below every timestamped file and are
/// ordered by name among themselves.
pub fn latest_file_with_prefix(dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    let stem_prefix = format!("{prefix}_");
    let latest = read_entries(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    DATA_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
        })
        .filter_map(|path| {
            let suffix = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.strip_prefix(stem_prefix.as_str()))?;
            let rank = (parse_run_timestamp(suffix), suffix.to_string());
            Some((rank, path))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, path)| path);
    Ok(latest)
}

/// Resolves a user-supplied input path. Files are returned as-is; for a
/// directory the newest run subdirectory (if any) is searched for the newest
/// `<prefix>_*` data file.
pub fn resolve_input(path: &Path, prefix: &str) -> Result<PathBuf> {
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }
    let search_dir = latest_run_dir(path)?.unwrap_or_else(|| path.to_path_buf());
    let resolved = latest_file_with_prefix(&search_dir, prefix)?.ok_or_else(|| {
        anyhow!("No '{prefix}_*' data file found in {search_dir:?}")
    })?;
    debug!("Resolved {:?} to {:?}", path, resolved);
    Ok(resolved)
}

/// Output path for a run: `dir/merged_<timestamp>.csv` when `path` is a
/// directory, otherwise `path` itself.
pub fn resolve_output(path: &Path, now: NaiveDateTime) -> PathBuf {
    if path.is_dir() {
        path.join(format!(
            "{OUTPUT_PREFIX}_{}.csv",
            now.format("%Y%m%d_%H%M%S")
        ))
    } else {
        path.to_path_buf()
    }
}
