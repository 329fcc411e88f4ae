//! Filesystem abstraction (spec §4.8).
//!
//! A [`RootedFs`] wraps raw file operations and guarantees every write
//! resolves within a caller-supplied project root. [`validate_dest_path`]
//! and [`validate_vendor_name`] are static predicates used before any
//! filesystem interaction, independent of a root.

pub mod temp;

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::GitVendorError;

pub use temp::ScopedTempWorkspace;

/// Strips a trailing position suffix (`:L5-L10`, `:L5C1:L9C3`, `:L5`,
/// `:L5-EOF`) from a path string before filesystem validation. Delegates
/// to the mapping module's grammar so multi-colon suffixes (column
/// ranges) are stripped in full rather than just past the last `:`.
fn strip_position_suffix(path: &str) -> String {
    crate::mapping::parse_position_path(path).0
}

/// Validates a destination path against the static rules in §4.8,
/// independent of any filesystem root.
///
/// Rejects: null bytes, paths starting with `/` or `\`, Windows drive
/// letters, host-absolute paths, and `..` at the start or as a separated
/// component.
pub fn validate_dest_path(path: &str) -> Result<(), GitVendorError> {
    let stripped = &strip_position_suffix(path);

    if stripped.contains('\0') {
        return Err(GitVendorError::InvalidPath {
            path: path.to_string(),
            reason: "contains a null byte".to_string(),
        });
    }
    if stripped.starts_with('/') || stripped.starts_with('\\') {
        return Err(GitVendorError::InvalidPath {
            path: path.to_string(),
            reason: "must be relative, not rooted".to_string(),
        });
    }
    let looks_like_drive_letter = stripped.len() >= 2
        && stripped.as_bytes()[0].is_ascii_alphabetic()
        && stripped.as_bytes()[1] == b':';
    if looks_like_drive_letter {
        return Err(GitVendorError::InvalidPath {
            path: path.to_string(),
            reason: "Windows drive letters are not allowed".to_string(),
        });
    }
    if Path::new(stripped).is_absolute() {
        return Err(GitVendorError::InvalidPath {
            path: path.to_string(),
            reason: "must not be an absolute path".to_string(),
        });
    }
    let normalized = stripped.replace('\\', "/");
    let components: Vec<&str> = normalized.split('/').collect();
    if components.first() == Some(&"..") || components.iter().any(|c| *c == "..") {
        return Err(GitVendorError::InvalidPath {
            path: path.to_string(),
            reason: "must not contain '..' components".to_string(),
        });
    }

    Ok(())
}

/// Validates a vendor name against §3's `VendorSpec.name` rules.
///
/// Rejects: empty strings, null bytes, path separators, and any `..`
/// substring.
pub fn validate_vendor_name(name: &str) -> Result<(), GitVendorError> {
    if name.is_empty() {
        return Err(GitVendorError::InvalidVendorName {
            name: name.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if name.contains('\0') {
        return Err(GitVendorError::InvalidVendorName {
            name: name.to_string(),
            reason: "must not contain a null byte".to_string(),
        });
    }
    if name.contains('/') || name.contains('\\') {
        return Err(GitVendorError::InvalidVendorName {
            name: name.to_string(),
            reason: "must not contain a path separator".to_string(),
        });
    }
    if name.contains("..") {
        return Err(GitVendorError::InvalidVendorName {
            name: name.to_string(),
            reason: "must not contain '..'".to_string(),
        });
    }
    Ok(())
}

/// A filesystem wrapper that guarantees every write resolves within
/// `root`.
///
/// Production code always constructs a rooted filesystem; unrooted access
/// exists only through [`RootedFs::unrooted`] for tests.
#[derive(Debug, Clone)]
pub struct RootedFs {
    root: Option<PathBuf>,
}

impl RootedFs {
    /// Creates a filesystem rooted at `root`. `root` is canonicalized if it
    /// exists; if it does not yet exist, it is used as given.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, GitVendorError> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        Ok(Self {
            root: Some(canonical),
        })
    }

    /// Creates a filesystem with no root guard. Tests only.
    pub fn unrooted() -> Self {
        Self {
            root: None,
        }
    }

    /// Validates that `path`, once made absolute, resolves within `root`.
    ///
    /// The separator suffix on the `root + separator` comparison is
    /// mandatory: `/tmp/foo` must not admit `/tmp/foobar`.
    pub fn validate_write_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, GitVendorError> {
        let Some(root) = &self.root else {
            return Ok(path.as_ref().to_path_buf());
        };
        let candidate = if path.as_ref().is_absolute() {
            path.as_ref().to_path_buf()
        } else {
            root.join(path.as_ref())
        };
        let candidate = normalize_lexically(&candidate);
        let root_with_sep = {
            let mut s = root.as_os_str().to_os_string();
            s.push(std::path::MAIN_SEPARATOR.to_string());
            PathBuf::from(s)
        };
        if candidate == *root || candidate.starts_with(&root_with_sep) {
            Ok(candidate)
        } else {
            Err(GitVendorError::InvalidPath {
                path: path.as_ref().display().to_string(),
                reason: format!("escapes project root '{}'", root.display()),
            })
        }
    }

    /// Writes `content` to `path` after validating it resolves within the
    /// root, creating parent directories as needed. Not atomic; see
    /// [`crate::lockfile::io`] and [`crate::manifest::io`] for the
    /// atomic write-temp-rename sequence used for the two canonical
    /// documents.
    pub fn write(&self, path: impl AsRef<Path>, content: &[u8]) -> Result<(), GitVendorError> {
        let resolved = self.validate_write_path(&path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| GitVendorError::io("mkdir", parent.display().to_string(), e))?;
        }
        fs::write(&resolved, content)
            .map_err(|e| GitVendorError::io("write", resolved.display().to_string(), e))
    }

    /// Reads the file at `path`, validating it resolves within the root.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, GitVendorError> {
        let resolved = self.validate_write_path(&path)?;
        fs::read(&resolved).map_err(|e| GitVendorError::io("read", resolved.display().to_string(), e))
    }

    /// Returns the root directory, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

/// Lexically normalizes `.`/`..` components without touching the
/// filesystem (the path may not exist yet).
fn normalize_lexically(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
