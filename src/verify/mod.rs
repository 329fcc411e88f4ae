//! Offline integrity verification (spec §4.4).
//!
//! Operates entirely against the working tree and the lockfile already on
//! disk; no VCS client is involved.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::core::GitVendorError;
use crate::lockfile::{Lock, LockDetails};
use crate::manifest::Manifest;

/// The classification of a single tracked or discovered destination file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    /// Current hash matches the lock.
    Verified,
    /// Current hash differs from the lock.
    Modified {
        expected: String,
        actual: String,
    },
    /// Present on disk but not recorded in the lock.
    Added,
    /// Recorded in the lock but missing on disk.
    Deleted,
    /// Differs from the lock but was explicitly accepted by the user.
    Accepted,
}

/// One file's verification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVerification {
    pub path: String,
    pub state: FileState,
}

/// Verification results for a single vendor's lock entry.
#[derive(Debug, Clone)]
pub struct VendorVerification {
    pub name: String,
    pub git_ref: String,
    pub files: Vec<FileVerification>,
}

impl VendorVerification {
    /// Count of files whose state is [`FileState::Modified`] or [`FileState::Deleted`].
    pub fn unacknowledged_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.state, FileState::Modified { .. } | FileState::Deleted))
            .count()
    }
}

/// Manifest/lock coherence: entries present on one side but not the other.
#[derive(Debug, Clone, Default)]
pub struct CoherenceReport {
    /// Manifest `(name, ref)` pairs with no matching lock entry.
    pub stale: Vec<(String, String)>,
    /// Lock `(name, ref)` pairs with no matching manifest entry.
    pub orphaned: Vec<(String, String)>,
}

/// SHA-256 of a file's contents, as lowercase hex.
pub fn hash_file(path: &Path) -> Result<String, GitVendorError> {
    let content = std::fs::read(path).map_err(|e| GitVendorError::io("read", path.display().to_string(), e))?;
    Ok(hash_bytes(&content))
}

fn hash_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Verifies every tracked file in `details` against `project_root`, plus a
/// separate scan for untracked (`added`) files under each destination
/// directory the lock references.
///
/// `accepted` holds destination paths the caller has externally marked as
/// accepted (spec §4.4): a path in this set that would otherwise be
/// `Modified` reports as `Accepted` instead.
pub fn verify_vendor(
    details: &LockDetails,
    project_root: &Path,
    accepted: &HashSet<String>,
) -> Result<VendorVerification, GitVendorError> {
    let mut files = Vec::new();
    let mut tracked_set: HashSet<&str> = HashSet::new();

    for (path, expected_hash) in &details.file_hashes {
        tracked_set.insert(path.as_str());
        let full_path = project_root.join(path);
        if !full_path.is_file() {
            files.push(FileVerification {
                path: path.clone(),
                state: FileState::Deleted,
            });
            continue;
        }
        let actual_hash = hash_file(&full_path)?;
        let state = if actual_hash == *expected_hash {
            FileState::Verified
        } else if accepted.contains(path) {
            FileState::Accepted
        } else {
            FileState::Modified {
                expected: expected_hash.clone(),
                actual: actual_hash,
            }
        };
        files.push(FileVerification {
            path: path.clone(),
            state,
        });
    }

    for added in scan_for_added_files(project_root, &details.file_hashes, &tracked_set)? {
        files.push(FileVerification {
            path: added,
            state: FileState::Added,
        });
    }

    Ok(VendorVerification {
        name: details.name.clone(),
        git_ref: details.git_ref.clone(),
        files,
    })
}

fn scan_for_added_files(
    project_root: &Path,
    file_hashes: &BTreeMap<String, String>,
    tracked_set: &HashSet<&str>,
) -> Result<Vec<String>, GitVendorError> {
    let mut dirs: HashSet<&Path> = HashSet::new();
    for path in file_hashes.keys() {
        if let Some(parent) = Path::new(path.as_str()).parent() {
            dirs.insert(parent);
        }
    }

    let mut added = Vec::new();
    for dir in dirs {
        let full_dir = project_root.join(dir);
        if !full_dir.is_dir() {
            continue;
        }
        for entry in walkdir::WalkDir::new(&full_dir).into_iter().filter_map(std::result::Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(project_root) else {
                continue;
            };
            let relative_str = relative.to_string_lossy().replace('\\', "/");
            if !tracked_set.contains(relative_str.as_str()) {
                added.push(relative_str);
            }
        }
    }
    added.sort();
    added.dedup();
    Ok(added)
}

/// Compares `manifest` and `lock` for coherence (spec §4.4).
pub fn check_coherence(manifest: &Manifest, lock: &Lock) -> CoherenceReport {
    let manifest_keys: Vec<(String, String)> = manifest
        .vendors
        .iter()
        .flat_map(|v| v.specs.iter().map(move |s| (v.name.clone(), s.git_ref.clone())))
        .collect();
    let lock_keys: Vec<(String, String)> = lock.vendors.iter().map(LockDetails::key).collect();

    let stale = manifest_keys.iter().filter(|k| !lock_keys.contains(k)).cloned().collect();
    let orphaned = lock_keys.iter().filter(|k| !manifest_keys.contains(k)).cloned().collect();

    CoherenceReport {
        stale,
        orphaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_details(file_hashes: BTreeMap<String, String>) -> LockDetails {
        LockDetails {
            name: "lib-a".into(),
            git_ref: "main".into(),
            source: crate::manifest::SourceKind::External,
            commit_hash: "abc1234".into(),
            updated: "2024-01-01T00:00:00Z".into(),
            license_spdx: "MIT".into(),
            license_path: None,
            file_hashes,
            source_file_hashes: BTreeMap::new(),
            position_hashes: BTreeMap::new(),
        }
    }

    #[test]
    fn unchanged_file_verifies() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("util.go"), b"hello").unwrap();
        let hash = hash_bytes(b"hello");
        let mut hashes = BTreeMap::new();
        hashes.insert("util.go".to_string(), hash);
        let result = verify_vendor(&sample_details(hashes), dir.path(), &HashSet::new()).unwrap();
        assert_eq!(result.files[0].state, FileState::Verified);
    }

    #[test]
    fn changed_file_is_modified() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("util.go"), b"changed").unwrap();
        let mut hashes = BTreeMap::new();
        hashes.insert("util.go".to_string(), hash_bytes(b"hello"));
        let result = verify_vendor(&sample_details(hashes), dir.path(), &HashSet::new()).unwrap();
        assert!(matches!(result.files[0].state, FileState::Modified { .. }));
    }

    #[test]
    fn accepted_path_overrides_modified() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("util.go"), b"changed").unwrap();
        let mut hashes = BTreeMap::new();
        hashes.insert("util.go".to_string(), hash_bytes(b"hello"));
        let mut accepted = HashSet::new();
        accepted.insert("util.go".to_string());
        let result = verify_vendor(&sample_details(hashes), dir.path(), &accepted).unwrap();
        assert_eq!(result.files[0].state, FileState::Accepted);
    }

    #[test]
    fn missing_file_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let mut hashes = BTreeMap::new();
        hashes.insert("gone.go".to_string(), hash_bytes(b"hello"));
        let result = verify_vendor(&sample_details(hashes), dir.path(), &HashSet::new()).unwrap();
        assert_eq!(result.files[0].state, FileState::Deleted);
    }

    #[test]
    fn untracked_sibling_file_is_added() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pkg")).unwrap();
        std::fs::write(dir.path().join("pkg/util.go"), b"hello").unwrap();
        std::fs::write(dir.path().join("pkg/extra.go"), b"surprise").unwrap();
        let mut hashes = BTreeMap::new();
        hashes.insert("pkg/util.go".to_string(), hash_bytes(b"hello"));
        let result = verify_vendor(&sample_details(hashes), dir.path(), &HashSet::new()).unwrap();
        assert!(result.files.iter().any(|f| f.path == "pkg/extra.go" && f.state == FileState::Added));
    }

    #[test]
    fn coherence_reports_stale_and_orphaned() {
        let mut manifest = Manifest::default();
        manifest.vendors.push(crate::manifest::VendorSpec {
            name: "lib-a".into(),
            source: crate::manifest::SourceKind::External,
            url: Some("https://example.com/a.git".into()),
            mirrors: Vec::new(),
            license: "MIT".into(),
            enforcement: None,
            direction: crate::manifest::Direction::SourceCanonical,
            specs: vec![crate::manifest::BranchSpec {
                git_ref: "main".into(),
                default_target: None,
                mapping: Vec::new(),
            }],
            hooks: None,
        });

        let mut lock = Lock::default();
        lock.vendors.push(sample_details(BTreeMap::new()));
        lock.vendors[0].name = "lib-b".to_string();

        let report = check_coherence(&manifest, &lock);
        assert_eq!(report.stale, vec![("lib-a".to_string(), "main".to_string())]);
        assert_eq!(report.orphaned, vec![("lib-b".to_string(), "main".to_string())]);
    }
}
