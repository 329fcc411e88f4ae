//! Scoped temporary workspaces.
//!
//! Every temp workspace the sync and drift pipelines acquire is guaranteed
//! removal on all exit paths (success, error, cancellation) per spec §5.
//! Built directly on [`tempfile::TempDir`], which already removes its
//! directory on `Drop` — the wrapper exists to give call sites a
//! vendor-scoped name and a single vocabulary for "a workspace the pipeline
//! can write into and will not outlive this operation".

use std::path::Path;

use tempfile::TempDir;

use crate::core::GitVendorError;

/// A scoped temporary workspace tied to one `(vendor, ref)` sync or drift
/// operation. Removed automatically when dropped, including on the error
/// and cancellation paths (ordinary `?` early-return drops it same as any
/// other local).
pub struct ScopedTempWorkspace {
    dir: TempDir,
}

impl ScopedTempWorkspace {
    /// Acquires a new workspace, prefixed for easier identification in
    /// `ps`/`lsof` output while a clone or checkout is in flight.
    pub fn acquire(label: &str) -> Result<Self, GitVendorError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("git-vendor-{label}-"))
            .tempdir()
            .map_err(|e| GitVendorError::io("mkdtemp", label.to_string(), e))?;
        Ok(Self {
            dir,
        })
    }

    /// Path to the workspace root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
