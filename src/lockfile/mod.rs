//! `vendor.lock` lockfile types (spec §3, §6).
//!
//! The lock is the authoritative record of what was actually fetched. It
//! is created and mutated only by the sync and compliance pipelines;
//! loading and persisting it is covered by [`io`], and the conflict-free
//! three-way merge needed after a VCS merge is [`merge`].

pub mod io;
pub mod merge;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::SCHEMA_VERSION;
use crate::manifest::SourceKind;

/// Per-vendor-per-ref resolved state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDetails {
    /// Mirrors the manifest vendor name.
    pub name: String,
    /// Mirrors the resolved branch spec's ref.
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Mirrors the manifest vendor's source kind.
    pub source: SourceKind,
    /// The exact resolved commit (opaque; see invariant 4 for abbreviation rules).
    pub commit_hash: String,
    /// RFC-3339 UTC timestamp of the last write to this entry.
    pub updated: String,
    /// Detected SPDX identifier, or `UNKNOWN`.
    pub license_spdx: String,
    /// Relative path to the cached license file, if one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_path: Option<String>,
    /// Destination path → SHA-256 of its content.
    #[serde(default)]
    pub file_hashes: BTreeMap<String, String>,
    /// Source path → SHA-256, internal vendors only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub source_file_hashes: BTreeMap<String, String>,
    /// `"from→to"` key → SHA-256 of extracted content, for position-narrowed mappings.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub position_hashes: BTreeMap<String, String>,
}

impl LockDetails {
    /// Key used to identify this entry within a [`Lock`]: `(name, ref)`.
    pub fn key(&self) -> (String, String) {
        (self.name.clone(), self.git_ref.clone())
    }
}

/// The complete `vendor.lock` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lock {
    /// Schema version string, parsed as `MAJOR.MINOR`.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Ordered sequence of resolved vendor×ref entries.
    #[serde(default)]
    pub vendors: Vec<LockDetails>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl Default for Lock {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            vendors: Vec::new(),
        }
    }
}

impl Lock {
    /// Convenience lookup: the commit hash for `(name, ref)`, or an empty
    /// string when absent.
    pub fn get_hash(&self, name: &str, git_ref: &str) -> String {
        self.vendors
            .iter()
            .find(|v| v.name == name && v.git_ref == git_ref)
            .map(|v| v.commit_hash.clone())
            .unwrap_or_default()
    }

    /// The entry for `(name, ref)`, if present.
    pub fn find(&self, name: &str, git_ref: &str) -> Option<&LockDetails> {
        self.vendors.iter().find(|v| v.name == name && v.git_ref == git_ref)
    }

    /// Replaces (or appends) the entry matching `details`' `(name, ref)` key.
    pub fn upsert(&mut self, details: LockDetails) {
        let key = details.key();
        if let Some(existing) = self.vendors.iter_mut().find(|v| v.key() == key) {
            *existing = details;
        } else {
            self.vendors.push(details);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, git_ref: &str, commit: &str) -> LockDetails {
        LockDetails {
            name: name.into(),
            git_ref: git_ref.into(),
            source: SourceKind::External,
            commit_hash: commit.into(),
            updated: "2024-01-01T00:00:00Z".into(),
            license_spdx: "MIT".into(),
            license_path: None,
            file_hashes: BTreeMap::new(),
            source_file_hashes: BTreeMap::new(),
            position_hashes: BTreeMap::new(),
        }
    }

    #[test]
    fn get_hash_returns_empty_when_absent() {
        let lock = Lock::default();
        assert_eq!(lock.get_hash("missing", "main"), "");
    }

    #[test]
    fn upsert_replaces_matching_key() {
        let mut lock = Lock::default();
        lock.upsert(sample("lib-a", "main", "aaa"));
        lock.upsert(sample("lib-a", "main", "bbb"));
        assert_eq!(lock.vendors.len(), 1);
        assert_eq!(lock.get_hash("lib-a", "main"), "bbb");
    }

    #[test]
    fn upsert_appends_distinct_keys() {
        let mut lock = Lock::default();
        lock.upsert(sample("lib-a", "main", "aaa"));
        lock.upsert(sample("lib-a", "v1", "ccc"));
        assert_eq!(lock.vendors.len(), 2);
    }
}
