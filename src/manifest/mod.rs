//! `vendor.yml` manifest types (spec §3, §6).
//!
//! The manifest is the declarative input: an ordered sequence of
//! [`VendorSpec`] entries plus an optional [`ComplianceConfig`]. It is
//! created by the user and mutated only by explicit add/remove operations
//! (those operations live at the CLI layer, out of scope here); this
//! module owns parsing, validation, and persistence.

pub mod io;
pub mod validation;

use serde::{Deserialize, Serialize};

use crate::constants::SCHEMA_VERSION;

/// Where a vendor's content is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Drawn from a remote URL.
    External,
    /// Drawn from the same project's working tree.
    Internal,
}

impl Default for SourceKind {
    fn default() -> Self {
        Self::External
    }
}

/// Synchronization direction for an internal vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// The source is authoritative; drift is copied source → destination.
    SourceCanonical,
    /// Either side may be authoritative; drift may be copied in either direction.
    Bidirectional,
}

impl Default for Direction {
    fn default() -> Self {
        Self::SourceCanonical
    }
}

/// Per-vendor enforcement severity (Spec-075 semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    /// Unacknowledged drift fails the run.
    Strict,
    /// Unacknowledged drift warns but does not fail the run.
    Lenient,
    /// Drift is reported but never affects the exit code.
    Info,
}

/// Optional pre/post command hooks for an external vendor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hooks {
    /// Command run before content extraction begins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre: Option<String>,
    /// Command run after the lockfile entry for this vendor is written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
}

/// A single `(from, to, exclude)` triple under a [`BranchSpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMapping {
    /// Source path, optionally carrying a position specifier.
    pub from: String,
    /// Destination path, optionally carrying a position specifier. Empty
    /// (or `"."`) means auto-computed (§4.2).
    #[serde(default)]
    pub to: String,
    /// Glob patterns excluded when `from` names a directory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

/// The shorthand and detailed forms a mapping may take in YAML: a bare
/// string is `from` with auto-computed `to` and no excludes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingEntry {
    /// `from: path/to/file` shorthand.
    Shorthand(String),
    /// `{from, to, exclude}` detailed form.
    Detailed(PathMapping),
}

impl MappingEntry {
    /// Normalizes either form into a [`PathMapping`].
    pub fn into_mapping(self) -> PathMapping {
        match self {
            Self::Shorthand(from) => PathMapping {
                from,
                to: String::new(),
                exclude: Vec::new(),
            },
            Self::Detailed(mapping) => mapping,
        }
    }
}

/// One ref (branch, tag, or commit hash) and the mappings drawn from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchSpec {
    /// The git ref; internal vendors MUST use [`crate::constants::INTERNAL_REF_SENTINEL`].
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Base directory used for mappings that omit an explicit `to`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_target: Option<String>,
    /// Non-empty ordered sequence of path mappings.
    pub mapping: Vec<MappingEntry>,
}

/// One logical dependency declared in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorSpec {
    /// Unique identifier; no path separators, no `..`, no null bytes, non-empty.
    pub name: String,
    /// `external` (default) or `internal`.
    #[serde(default)]
    pub source: SourceKind,
    /// Fetch URL, external vendors only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Ordered fallback URLs, external vendors only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mirrors: Vec<String>,
    /// SPDX identifier, or `UNKNOWN`.
    #[serde(default = "default_license")]
    pub license: String,
    /// Per-vendor enforcement override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement: Option<Enforcement>,
    /// Synchronization direction, internal vendors only.
    #[serde(default)]
    pub direction: Direction,
    /// Non-empty ordered sequence of branch specs.
    pub specs: Vec<BranchSpec>,
    /// Pre/post command hooks, external vendors only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<Hooks>,
}

fn default_license() -> String {
    "UNKNOWN".to_string()
}

impl VendorSpec {
    /// Convenience: is this vendor internal?
    pub fn is_internal(&self) -> bool {
        matches!(self.source, SourceKind::Internal)
    }
}

/// Global enforcement defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// The default enforcement level applied when a vendor has none.
    pub default: Enforcement,
    /// `default` (per-vendor wins) or `override` (global wins everywhere).
    #[serde(default)]
    pub mode: ComplianceMode,
}

/// How [`ComplianceConfig::default`] interacts with per-vendor overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceMode {
    /// Per-vendor `enforcement` wins; falls back to the global default.
    Default,
    /// The global default applies to every vendor, overriding per-vendor settings.
    Override,
}

impl Default for ComplianceMode {
    fn default() -> Self {
        Self::Default
    }
}

/// The complete `vendor.yml` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Schema version string, e.g. `"1.2"`.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Global enforcement defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<ComplianceConfig>,
    /// Ordered sequence of declared dependencies.
    #[serde(default)]
    pub vendors: Vec<VendorSpec>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            compliance: None,
            vendors: Vec::new(),
        }
    }
}
