//! Field policy registry.
//!
//! Maps every known column to exactly one [`MergeStrategyKind`] and a
//! [`MandatoryKind`]. Columns missing from the registry fall back to
//! `keep_base_only` / `optional`. The built-in table can be extended or
//! overridden from a YAML file:
//!
//! ```yaml
//! fields:
//!   status:
//!     strategy: validated_status_transition
//!     mandatory: required_base_only
//!   reviewer_notes:
//!     strategy: concatenate_with_labels
//! ```

use std::{collections::BTreeMap, collections::HashMap, fmt, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::strategy::MergeStrategyKind::{self, *};

use self::MandatoryKind::{Optional, RequiredBaseOnly};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MandatoryKind {
    /// Both base and follow-up must hold a non-null value.
    RequiredBoth,
    /// Base must hold a value; follow-up must not supply one.
    RequiredBaseOnly,
    #[default]
    Optional,
}

impl MandatoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MandatoryKind::RequiredBoth => "required_both",
            MandatoryKind::RequiredBaseOnly => "required_base_only",
            MandatoryKind::Optional => "optional",
        }
    }
}

impl fmt::Display for MandatoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldPolicy {
    pub strategy: MergeStrategyKind,
    #[serde(default)]
    pub mandatory: MandatoryKind,
}

impl FieldPolicy {
    pub const fn new(strategy: MergeStrategyKind, mandatory: MandatoryKind) -> Self {
        Self {
            strategy,
            mandatory,
        }
    }

    pub const fn optional(strategy: MergeStrategyKind) -> Self {
        Self::new(strategy, MandatoryKind::Optional)
    }
}

impl Default for FieldPolicy {
    fn default() -> Self {
        FieldPolicy::optional(MergeStrategyKind::KeepBaseOnly)
    }
}

/// On-disk shape of a policy override file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyOverrides {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldPolicy>,
}

impl PolicyOverrides {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening policy file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).context("Parsing policy YAML")
    }
}

const BUILTIN_POLICIES: &[(&str, MergeStrategyKind, MandatoryKind)] = &[
    ("registration_number", KeepBaseOnly, Optional),
    ("title", KeepBaseOnly, RequiredBaseOnly),
    ("responsible_body", KeepBaseOnly, RequiredBaseOnly),
    ("registration_date", KeepBaseOnly, RequiredBaseOnly),
    ("category", KeepBaseOnly, Optional),
    ("sector", KeepBaseOnly, Optional),
    ("region", KeepBaseOnly, Optional),
    ("source_url", KeepBaseOnly, Optional),
    ("description", ConcatenateWithLabels, Optional),
    ("response_text", ConcatenateWithLabels, Optional),
    ("notes", ConcatenateWithLabels, Optional),
    ("implementation_summary", ConcatenateWithLabels, Optional),
    ("contact_details", JsonObjectUnion, Optional),
    ("officials", JsonObjectUnionWithListMerge, Optional),
    ("financial_commitments", JsonObjectUnionWithListMerge, Optional),
    ("milestones", JsonObjectUnionWithListMerge, Optional),
    ("related_documents", JsonListUnion, Optional),
    ("attachments", JsonListUnion, Optional),
    ("linked_registrations", JsonListUnion, Optional),
    ("tags", JsonListUnion, Optional),
    ("has_response", BooleanOr, Optional),
    ("is_public", BooleanOr, Optional),
    ("has_attachments", BooleanOr, Optional),
    ("response_overdue", MonotonicTrueOnFollowup, Optional),
    ("escalated", MonotonicTrueOnFollowup, Optional),
    ("is_closed", AuthoritativeBasePriorityBoolean, Optional),
    ("is_withdrawn", AuthoritativeBasePriorityBoolean, Optional),
    ("last_updated", LatestDateMax, Optional),
    ("response_date", LatestDateMax, Optional),
    ("last_checked", LatestDateMax, Optional),
    ("status", ValidatedStatusTransition, Optional),
    ("implementation_status", ValidatedStatusTransition, Optional),
    ("expected_completion_date", PreferFollowupDate, Optional),
    ("next_review_date", PreferFollowupDate, Optional),
];

/// Ordered field → policy table.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    entries: Vec<(String, FieldPolicy)>,
    positions: HashMap<String, usize>,
}

impl PolicyRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, strategy, mandatory) in BUILTIN_POLICIES {
            registry.set(*name, FieldPolicy::new(*strategy, *mandatory));
        }
        registry
    }

    /// Built-in table with the overrides from `path` applied on top.
    pub fn load_with_overrides(path: &Path) -> Result<Self> {
        let overrides = PolicyOverrides::load(path)
            .with_context(|| format!("Loading policy overrides from {path:?}"))?;
        let mut registry = Self::builtin();
        registry.apply_overrides(&overrides);
        Ok(registry)
    }

    pub fn apply_overrides(&mut self, overrides: &PolicyOverrides) {
        for (name, policy) in &overrides.fields {
            self.set(name.clone(), *policy);
        }
    }

    pub fn set(&mut self, field: impl Into<String>, policy: FieldPolicy) {
        let field = field.into();
        match self.positions.get(&field) {
            Some(&idx) => self.entries[idx].1 = policy,
            None => {
                self.positions.insert(field.clone(), self.entries.len());
                self.entries.push((field, policy));
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldPolicy> {
        self.positions.get(field).map(|&idx| &self.entries[idx].1)
    }

    /// Registered policy, or `keep_base_only` / `optional` for unknown fields.
    pub fn policy_for(&self, field: &str) -> FieldPolicy {
        self.get(field).copied().unwrap_or_default()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldPolicy)> {
        self.entries
            .iter()
            .map(|(name, policy)| (name.as_str(), policy))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
