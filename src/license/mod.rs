//! License discovery and classification (spec §4.3 step 5-6, §6).
//!
//! Discovery (which file, if any) is the core's job; classifying file
//! content into an SPDX identifier is named in §6 as an external
//! collaborator (`ClassifyTree(dir) -> SPDX-or-UNKNOWN`) and is therefore
//! a trait here with only a minimal heuristic default, the same shape
//! [`crate::source::GenericProvider`] takes for URL parsing.

use std::path::{Path, PathBuf};

use crate::constants::{LICENSES_DIRNAME, LICENSE_FILENAMES, VENDOR_DIR};
use crate::core::GitVendorError;
use crate::fs::{validate_vendor_name, RootedFs};

/// Classifies a checked-out tree's license file into an SPDX identifier.
pub trait LicenseClassifier: Send + Sync {
    /// Returns the best-guess SPDX identifier for `dir`'s license, or
    /// `"UNKNOWN"` if nothing recognizable was found.
    fn classify(&self, dir: &Path) -> Result<String, GitVendorError>;
}

/// A minimal keyword-matching classifier. Concrete, comprehensive license
/// classification (full SPDX corpus matching) is out of scope for the
/// core per spec §1; this default exists so the sync pipeline has
/// something to call out of the box.
#[derive(Debug, Default)]
pub struct HeuristicClassifier;

impl LicenseClassifier for HeuristicClassifier {
    fn classify(&self, dir: &Path) -> Result<String, GitVendorError> {
        let Some(path) = discover_license_file(dir) else {
            return Ok("UNKNOWN".to_string());
        };
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        Ok(classify_content(&content))
    }
}

/// Scans `dir` for the first existing file among the conventional license
/// filenames, in priority order.
pub fn discover_license_file(dir: &Path) -> Option<PathBuf> {
    LICENSE_FILENAMES.iter().map(|name| dir.join(name)).find(|path| path.is_file())
}

fn classify_content(content: &str) -> String {
    let lower = content.to_lowercase();
    const MATCHES: &[(&str, &str)] = &[
        ("mit license", "MIT"),
        ("apache license", "Apache-2.0"),
        ("gnu general public license", "GPL-3.0-only"),
        ("gnu lesser general public license", "LGPL-3.0-only"),
        ("mozilla public license", "MPL-2.0"),
        ("bsd 3-clause", "BSD-3-Clause"),
        ("bsd 2-clause", "BSD-2-Clause"),
        ("the unlicense", "Unlicense"),
    ];
    for (needle, spdx) in MATCHES {
        if lower.contains(needle) {
            return (*spdx).to_string();
        }
    }
    "UNKNOWN".to_string()
}

/// Copies `source_file` into `.git-vendor/licenses/<name>.txt`, validating
/// `name` first so a malicious vendor name can never escape the licenses
/// directory.
pub fn copy_license(fs: &RootedFs, name: &str, source_file: &Path) -> Result<String, GitVendorError> {
    validate_vendor_name(name)?;
    let relative = format!("{VENDOR_DIR}/{LICENSES_DIRNAME}/{name}.txt");
    let content = std::fs::read(source_file).map_err(|e| GitVendorError::io("read", source_file.display().to_string(), e))?;
    fs.write(&relative, &content)?;
    Ok(relative)
}
