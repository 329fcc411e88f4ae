//! Manifest persistence: load, validate, save, locate (spec §4.1).

use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{MANIFEST_FILENAME, SCHEMA_VERSION, VENDOR_DIR};
use crate::core::GitVendorError;

use super::validation::validate_manifest;
use super::Manifest;

/// Owns the on-disk `vendor.yml` document.
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    /// Creates a store for the manifest under `project_root/.git-vendor/vendor.yml`.
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            path: project_root.as_ref().join(VENDOR_DIR).join(MANIFEST_FILENAME),
        }
    }

    /// Creates a store for an explicit manifest path (tests, alternate layouts).
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// The canonical on-disk location of this manifest.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads, parses, and validates the manifest.
    ///
    /// Fails with [`GitVendorError::InvalidConfig`] on malformed YAML or
    /// on structural validation failure.
    pub fn load(&self) -> Result<Manifest, GitVendorError> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| GitVendorError::io("read", self.path.display().to_string(), e))?;
        let manifest: Manifest = serde_yaml::from_str(&raw).map_err(|e| GitVendorError::InvalidConfig {
            reason: format!("invalid YAML in {}: {e}", self.path.display()),
        })?;
        validate_manifest(&manifest)?;
        Ok(manifest)
    }

    /// Atomically writes `manifest`: serialize to a sibling temp file,
    /// fsync, rename. Always stamps the current schema version.
    pub fn save(&self, manifest: &Manifest) -> Result<(), GitVendorError> {
        let mut stamped = manifest.clone();
        stamped.schema_version = SCHEMA_VERSION.to_string();

        let yaml = serde_yaml::to_string(&stamped).map_err(|e| GitVendorError::InvalidConfig {
            reason: format!("failed to serialize manifest: {e}"),
        })?;

        atomic_write(&self.path, yaml.as_bytes())
    }
}

/// Write-temp, fsync, rename — the atomic-write sequence used for both
/// canonical documents (§4.1).
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<(), GitVendorError> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| GitVendorError::io("mkdir", parent.display().to_string(), e))?;
    }

    let tmp_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });

    {
        let mut file = fs::File::create(&tmp_path)
            .map_err(|e| GitVendorError::io("create", tmp_path.display().to_string(), e))?;
        file.write_all(content)
            .map_err(|e| GitVendorError::io("write", tmp_path.display().to_string(), e))?;
        file.sync_all()
            .map_err(|e| GitVendorError::io("fsync", tmp_path.display().to_string(), e))?;
    }

    fs::rename(&tmp_path, path).map_err(|e| GitVendorError::io("rename", path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{BranchSpec, MappingEntry, SourceKind, VendorSpec};

    #[test]
    fn round_trips_a_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());

        let mut manifest = Manifest::default();
        manifest.vendors.push(VendorSpec {
            name: "lib-a".into(),
            source: SourceKind::External,
            url: Some("https://github.com/org/lib-a".into()),
            mirrors: vec![],
            license: "MIT".into(),
            enforcement: None,
            direction: Default::default(),
            specs: vec![BranchSpec {
                git_ref: "main".into(),
                default_target: None,
                mapping: vec![MappingEntry::Detailed(crate::manifest::PathMapping {
                    from: "src/util.go".into(),
                    to: "pkg/util.go".into(),
                    exclude: vec![],
                })],
            }],
            hooks: None,
        });

        store.save(&manifest).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.vendors.len(), 1);
        assert_eq!(loaded.vendors[0].name, "lib-a");
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn malformed_yaml_is_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vendor.yml");
        fs::write(&path, "not: [valid yaml").unwrap();
        let store = ManifestStore::at_path(path);
        assert!(matches!(store.load(), Err(GitVendorError::InvalidConfig { .. })));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());
        store.save(&Manifest::default()).unwrap();
        assert!(store.path().exists());
    }
}
