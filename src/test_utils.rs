//! Test fixtures and a scratch project builder, gated behind `test-utils`
//! so integration tests in other crates can reuse them (grounded on the
//! teacher's own `test_utils` module convention).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::constants::{LOCKFILE_FILENAME, MANIFEST_FILENAME, VENDOR_DIR};
use crate::lockfile::Lock;
use crate::manifest::{BranchSpec, Direction, Manifest, MappingEntry, SourceKind, VendorSpec};

static INIT_LOGGING: Once = Once::new();

/// Initializes a test-scoped `tracing` subscriber exactly once, honoring
/// `RUST_LOG` if set. A no-op on subsequent calls.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(Level::WARN.to_string())
        };
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

/// A scratch project directory under `.git-vendor/`, with helpers for
/// writing a manifest and lockfile and reading back what a pipeline wrote.
pub struct TestProject {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl TestProject {
    /// Creates an empty project directory.
    pub fn new() -> Self {
        init_test_logging();
        let temp_dir = TempDir::new().expect("create temp project dir");
        let root = temp_dir.path().to_path_buf();
        fs::create_dir_all(root.join(VENDOR_DIR)).expect("create .git-vendor dir");
        Self {
            temp_dir,
            root,
        }
    }

    /// Absolute path to a project-relative path.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Writes `manifest` as YAML to the conventional `vendor.yml` location.
    pub fn write_manifest(&self, manifest: &Manifest) {
        let yaml = serde_yaml::to_string(manifest).expect("serialize manifest");
        fs::write(self.root.join(VENDOR_DIR).join(MANIFEST_FILENAME), yaml).expect("write manifest");
    }

    /// Writes `lock` as YAML to the conventional `vendor.lock` location.
    pub fn write_lock(&self, lock: &Lock) {
        let yaml = serde_yaml::to_string(lock).expect("serialize lock");
        fs::write(self.root.join(VENDOR_DIR).join(LOCKFILE_FILENAME), yaml).expect("write lock");
    }

    /// Writes a file (creating parent directories) relative to the project root.
    pub fn write_file(&self, relative: impl AsRef<Path>, content: impl AsRef<[u8]>) {
        let full = self.path(relative);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(full, content).expect("write fixture file");
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// A single external vendor, `lib-a`, fetched from `https://example.com/lib-a.git`
/// at ref `main`, mapping `src/util.go` into `lib-a/util.go`.
pub fn sample_external_manifest() -> Manifest {
    let mut manifest = Manifest::default();
    manifest.vendors.push(VendorSpec {
        name: "lib-a".to_string(),
        source: SourceKind::External,
        url: Some("https://example.com/lib-a.git".to_string()),
        mirrors: Vec::new(),
        license: "MIT".to_string(),
        enforcement: None,
        direction: Direction::SourceCanonical,
        specs: vec![BranchSpec {
            git_ref: "main".to_string(),
            default_target: None,
            mapping: vec![MappingEntry::Shorthand("src/util.go".to_string())],
        }],
        hooks: None,
    });
    manifest
}

/// A single internal vendor, `internal-a`, mirroring `src/shared/util.go`
/// into `pkg/util.go`.
pub fn sample_internal_manifest() -> Manifest {
    let mut manifest = Manifest::default();
    manifest.vendors.push(VendorSpec {
        name: "internal-a".to_string(),
        source: SourceKind::Internal,
        url: None,
        mirrors: Vec::new(),
        license: "UNKNOWN".to_string(),
        enforcement: None,
        direction: Direction::SourceCanonical,
        specs: vec![BranchSpec {
            git_ref: crate::constants::INTERNAL_REF_SENTINEL.to_string(),
            default_target: Some("pkg".to_string()),
            mapping: vec![MappingEntry::Shorthand("src/shared/util.go".to_string())],
        }],
        hooks: None,
    });
    manifest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_round_trips_manifest() {
        let project = TestProject::new();
        let manifest = sample_external_manifest();
        project.write_manifest(&manifest);
        let written = fs::read_to_string(project.path(format!("{VENDOR_DIR}/{MANIFEST_FILENAME}"))).unwrap();
        assert!(written.contains("lib-a"));
    }

    #[test]
    fn write_file_creates_parent_dirs() {
        let project = TestProject::new();
        project.write_file("a/b/c.go", b"package c");
        assert!(project.path("a/b/c.go").exists());
    }
}
