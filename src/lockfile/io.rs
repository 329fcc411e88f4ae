//! Lockfile persistence: load with schema gating and conflict detection,
//! save, locate (spec §4.1, invariant 5).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::constants::{LOCKFILE_FILENAME, SCHEMA_VERSION, VENDOR_DIR};
use crate::core::GitVendorError;
use crate::manifest::io::atomic_write;

use super::Lock;

/// Owns the on-disk `vendor.lock` document.
pub struct LockStore {
    path: PathBuf,
}

impl LockStore {
    /// Creates a store for the lockfile under `project_root/.git-vendor/vendor.lock`.
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            path: project_root.as_ref().join(VENDOR_DIR).join(LOCKFILE_FILENAME),
        }
    }

    /// Creates a store for an explicit lockfile path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// The canonical on-disk location of this lockfile.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads, parses, and schema-gates the lockfile.
    ///
    /// Detects unresolved VCS conflict markers before attempting to
    /// parse, so [`GitVendorError::MergeConflict`] always reports line
    /// numbers rather than a generic YAML parse failure. Returns
    /// [`Ok(None)`] if the lockfile does not yet exist (first sync has
    /// not happened).
    pub fn load(&self) -> Result<Option<Lock>, GitVendorError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(GitVendorError::io("read", self.path.display().to_string(), e)),
        };

        detect_conflict_markers(&raw)?;

        let lock: Lock = serde_yaml::from_str(&raw).map_err(|e| GitVendorError::InvalidConfig {
            reason: format!("invalid YAML in {}: {e}", self.path.display()),
        })?;

        gate_schema_version(&lock.schema_version)?;

        Ok(Some(lock))
    }

    /// Atomically writes `lock`, always stamping the current schema version.
    pub fn save(&self, lock: &Lock) -> Result<(), GitVendorError> {
        let mut stamped = lock.clone();
        stamped.schema_version = SCHEMA_VERSION.to_string();

        let yaml = serde_yaml::to_string(&stamped).map_err(|e| GitVendorError::InvalidConfig {
            reason: format!("failed to serialize lockfile: {e}"),
        })?;

        atomic_write(&self.path, yaml.as_bytes())
    }
}

/// Scans `content` for `<<<<<<<`/`=======`/`>>>>>>>` regions and fails
/// with their 1-indexed opening-marker line numbers if any are found.
fn detect_conflict_markers(content: &str) -> Result<(), GitVendorError> {
    let conflict_lines: Vec<usize> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| line.starts_with("<<<<<<<"))
        .map(|(idx, _)| idx + 1)
        .collect();

    if conflict_lines.is_empty() {
        return Ok(());
    }

    Err(GitVendorError::MergeConflict {
        count: conflict_lines.len(),
        first_line: conflict_lines[0],
        conflict_lines,
    })
}

/// Parses a `MAJOR.MINOR` schema version string.
pub fn parse_schema_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.splitn(2, '.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

/// Applies invariant 5: a major mismatch above this build's version is a
/// hard error; a minor mismatch above is a warning; equal or lower is
/// accepted silently.
fn gate_schema_version(found: &str) -> Result<(), GitVendorError> {
    let Some((supported_major, supported_minor)) = parse_schema_version(SCHEMA_VERSION) else {
        return Ok(());
    };
    let Some((found_major, found_minor)) = parse_schema_version(found) else {
        return Err(GitVendorError::InvalidConfig {
            reason: format!("lockfile schema_version '{found}' is not in MAJOR.MINOR form"),
        });
    };

    if found_major > supported_major {
        return Err(GitVendorError::SchemaTooNew {
            found: found.to_string(),
            supported: SCHEMA_VERSION.to_string(),
        });
    }
    if found_major == supported_major && found_minor > supported_minor {
        warn!(
            found_version = %found,
            supported_version = %SCHEMA_VERSION,
            "lockfile schema minor version is newer than this build"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockfile::LockDetails;
    use crate::manifest::SourceKind;
    use std::collections::BTreeMap;

    #[test]
    fn round_trips_a_lock() {
        let dir = tempfile::tempdir().unwrap();
        let store = LockStore::new(dir.path());

        let mut lock = Lock::default();
        lock.vendors.push(LockDetails {
            name: "lib-a".into(),
            git_ref: "main".into(),
            source: SourceKind::External,
            commit_hash: "abc1234".into(),
            updated: "2024-01-01T00:00:00Z".into(),
            license_spdx: "MIT".into(),
            license_path: None,
            file_hashes: BTreeMap::from([("pkg/util.go".to_string(), "deadbeef".to_string())]),
            source_file_hashes: BTreeMap::new(),
            position_hashes: BTreeMap::new(),
        });

        store.save(&lock).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.vendors.len(), 1);
        assert_eq!(loaded.vendors[0].commit_hash, "abc1234");
    }

    #[test]
    fn missing_lockfile_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LockStore::new(dir.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn conflict_markers_report_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vendor.lock");
        let content = "schema_version: \"1.2\"\nvendors:\n<<<<<<< ours\nfoo\n=======\nbar\n>>>>>>> theirs\n";
        fs::write(&path, content).unwrap();
        let store = LockStore::at_path(path);
        match store.load() {
            Err(GitVendorError::MergeConflict {
                first_line,
                count,
                ..
            }) => {
                assert_eq!(first_line, 3);
                assert_eq!(count, 1);
            }
            other => panic!("expected MergeConflict, got {other:?}"),
        }
    }

    #[test]
    fn major_version_above_supported_is_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vendor.lock");
        fs::write(&path, "schema_version: \"99.0\"\nvendors: []\n").unwrap();
        let store = LockStore::at_path(path);
        assert!(matches!(store.load(), Err(GitVendorError::SchemaTooNew { .. })));
    }

    #[test]
    fn minor_version_above_supported_is_accepted_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vendor.lock");
        fs::write(&path, "schema_version: \"1.99\"\nvendors: []\n").unwrap();
        let store = LockStore::at_path(path);
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn equal_or_lower_schema_is_accepted() {
        assert_eq!(parse_schema_version("1.2"), Some((1, 2)));
        assert!(gate_schema_version("1.0").is_ok());
        assert!(gate_schema_version("1.2").is_ok());
    }
}
