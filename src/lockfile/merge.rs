//! Three-way lock merge for VCS conflict resolution (spec §4.1, P3).
//!
//! Resolution is total: unlike [`super::io::LockStore::load`], which fails
//! on unresolved conflict markers, [`merge_locks`] never produces a
//! conflict outcome — every `(name, ref)` key is resolved deterministically
//! by comparing `updated` timestamps and, as a last resort, commit hashes.

use std::collections::BTreeMap;

use super::io::parse_schema_version;
use super::{Lock, LockDetails};

/// One `(name, ref)` key whose two candidate entries disagreed and were
/// resolved, reported back for the caller's merge summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// The vendor name.
    pub name: String,
    /// The ref.
    pub git_ref: String,
    /// `updated` timestamp chosen as the winner.
    pub winner_updated: String,
}

/// Merges `ours` and `theirs` deterministically. Returns the merged
/// document and the (possibly empty) list of keys that disagreed and had
/// to be resolved.
pub fn merge_locks(ours: &Lock, theirs: &Lock) -> (Lock, Vec<ResolvedEntry>) {
    let mut by_key: BTreeMap<(String, String), Vec<&LockDetails>> = BTreeMap::new();
    for details in ours.vendors.iter().chain(theirs.vendors.iter()) {
        by_key.entry(details.key()).or_default().push(details);
    }

    let mut merged_vendors = Vec::new();
    let mut resolved = Vec::new();

    for ((name, git_ref), candidates) in &by_key {
        let winner = match candidates.as_slice() {
            [single] => (*single).clone(),
            [a, b] => {
                let (winner, was_conflict) = resolve_pair(a, b);
                if was_conflict {
                    resolved.push(ResolvedEntry {
                        name: name.clone(),
                        git_ref: git_ref.clone(),
                        winner_updated: winner.updated.clone(),
                    });
                }
                winner
            }
            // A key present in both inputs more than twice cannot happen
            // (each Lock carries at most one entry per key), but fold
            // deterministically if it ever does.
            many => many
                .iter()
                .copied()
                .cloned()
                .reduce(|a, b| resolve_pair(&a, &b).0)
                .expect("many is non-empty"),
        };
        merged_vendors.push(winner);
    }

    merged_vendors.sort_by(|a, b| a.key().cmp(&b.key()));

    let schema_version = higher_schema_version(&ours.schema_version, &theirs.schema_version);

    (
        Lock {
            schema_version,
            vendors: merged_vendors,
        },
        resolved,
    )
}

/// Resolves one disagreeing pair. Returns the winner and whether the pair
/// actually disagreed (same-key entries with identical content never
/// count as a reported conflict).
fn resolve_pair(a: &LockDetails, b: &LockDetails) -> (LockDetails, bool) {
    if a == b {
        return (a.clone(), false);
    }

    if a.commit_hash == b.commit_hash {
        // Identical resolved state; take the entry with the lexicographically
        // greater `updated` (RFC-3339 sorts chronologically).
        return if a.updated >= b.updated {
            (a.clone(), true)
        } else {
            (b.clone(), true)
        };
    }

    let winner = match a.updated.cmp(&b.updated) {
        std::cmp::Ordering::Greater => a,
        std::cmp::Ordering::Less => b,
        std::cmp::Ordering::Equal => {
            if a.commit_hash >= b.commit_hash {
                a
            } else {
                b
            }
        }
    };
    (winner.clone(), true)
}

/// Picks the higher of two `MAJOR.MINOR` schema version strings.
fn higher_schema_version(a: &str, b: &str) -> String {
    match (parse_schema_version(a), parse_schema_version(b)) {
        (Some(pa), Some(pb)) => {
            if pa >= pb {
                a.to_string()
            } else {
                b.to_string()
            }
        }
        (Some(_), None) => a.to_string(),
        (None, Some(_)) => b.to_string(),
        (None, None) => a.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::SourceKind;
    use std::collections::BTreeMap as Map;

    fn entry(name: &str, git_ref: &str, commit: &str, updated: &str) -> LockDetails {
        LockDetails {
            name: name.into(),
            git_ref: git_ref.into(),
            source: SourceKind::External,
            commit_hash: commit.into(),
            updated: updated.into(),
            license_spdx: "MIT".into(),
            license_path: None,
            file_hashes: Map::new(),
            source_file_hashes: Map::new(),
            position_hashes: Map::new(),
        }
    }

    #[test]
    fn picks_newer_updated_on_differing_commits() {
        let ours = Lock {
            vendors: vec![entry("lib-a", "main", "aaa", "2024-01-01T00:00:00Z")],
            ..Lock::default()
        };
        let theirs = Lock {
            vendors: vec![entry("lib-a", "main", "bbb", "2024-02-01T00:00:00Z")],
            ..Lock::default()
        };
        let (merged, resolved) = merge_locks(&ours, &theirs);
        assert_eq!(merged.get_hash("lib-a", "main"), "bbb");
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn merge_is_commutative() {
        let ours = Lock {
            vendors: vec![entry("lib-a", "main", "aaa", "2024-01-01T00:00:00Z")],
            ..Lock::default()
        };
        let theirs = Lock {
            vendors: vec![entry("lib-a", "main", "bbb", "2024-02-01T00:00:00Z")],
            ..Lock::default()
        };
        let (merged_ab, _) = merge_locks(&ours, &theirs);
        let (merged_ba, _) = merge_locks(&theirs, &ours);
        assert_eq!(merged_ab.vendors, merged_ba.vendors);
    }

    #[test]
    fn equal_timestamps_break_tie_on_commit_hash() {
        let ours = Lock {
            vendors: vec![entry("lib-a", "main", "aaa", "2024-01-01T00:00:00Z")],
            ..Lock::default()
        };
        let theirs = Lock {
            vendors: vec![entry("lib-a", "main", "zzz", "2024-01-01T00:00:00Z")],
            ..Lock::default()
        };
        let (merged, _) = merge_locks(&ours, &theirs);
        assert_eq!(merged.get_hash("lib-a", "main"), "zzz");
    }

    #[test]
    fn disjoint_keys_both_survive() {
        let ours = Lock {
            vendors: vec![entry("lib-a", "main", "aaa", "2024-01-01T00:00:00Z")],
            ..Lock::default()
        };
        let theirs = Lock {
            vendors: vec![entry("lib-b", "main", "bbb", "2024-01-01T00:00:00Z")],
            ..Lock::default()
        };
        let (merged, resolved) = merge_locks(&ours, &theirs);
        assert_eq!(merged.vendors.len(), 2);
        assert!(resolved.is_empty());
    }

    #[test]
    fn merge_takes_higher_schema_version() {
        let ours = Lock {
            schema_version: "1.1".into(),
            vendors: vec![],
        };
        let theirs = Lock {
            schema_version: "1.2".into(),
            vendors: vec![],
        };
        let (merged, _) = merge_locks(&ours, &theirs);
        assert_eq!(merged.schema_version, "1.2");
    }

    #[test]
    fn identical_entries_never_report_conflict() {
        let ours = Lock {
            vendors: vec![entry("lib-a", "main", "aaa", "2024-01-01T00:00:00Z")],
            ..Lock::default()
        };
        let (_, resolved) = merge_locks(&ours, &ours.clone());
        assert!(resolved.is_empty());
    }
}
