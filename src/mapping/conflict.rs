//! Destination conflict detection (spec §4.2, invariant 2).

use std::collections::HashMap;

use crate::core::GitVendorError;

use super::{normalize_separators, parse_position_path};

/// One mapping's resolved destination, tagged with its owning vendor/ref
/// for diagnostics.
#[derive(Debug, Clone)]
pub struct MappingOwner {
    /// Owning vendor name.
    pub vendor: String,
    /// Owning branch spec ref.
    pub git_ref: String,
    /// The mapping's (possibly auto-computed) destination path, before
    /// position stripping.
    pub destination: String,
}

/// Detects both exact and structural destination conflicts across the
/// whole manifest.
///
/// Exact: two or more mappings normalize to the same destination file
/// path (position stripped). Structural: two destination paths from
/// different vendors where one is a strict prefix directory of the
/// other.
pub fn detect_conflicts(owners: &[MappingOwner]) -> Result<(), GitVendorError> {
    let mut by_path: HashMap<String, Vec<&MappingOwner>> = HashMap::new();
    for owner in owners {
        let (file_path, _, _) = parse_position_path(&owner.destination);
        let normalized = normalize_separators(&file_path);
        by_path.entry(normalized).or_default().push(owner);
    }

    for (path, owners) in &by_path {
        if owners.len() > 1 {
            return Err(GitVendorError::PathConflict {
                path: path.clone(),
                vendor_a: owners[0].vendor.clone(),
                vendor_b: owners[1].vendor.clone(),
            });
        }
    }

    let paths: Vec<(String, &MappingOwner)> = by_path
        .iter()
        .map(|(path, owners)| (path.clone(), owners[0]))
        .collect();

    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            let (path_a, owner_a) = &paths[i];
            let (path_b, owner_b) = &paths[j];
            if owner_a.vendor == owner_b.vendor {
                continue;
            }
            if is_strict_prefix_dir(path_a, path_b) || is_strict_prefix_dir(path_b, path_a) {
                return Err(GitVendorError::PathConflict {
                    path: format!("{path_a} / {path_b}"),
                    vendor_a: owner_a.vendor.clone(),
                    vendor_b: owner_b.vendor.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Whether `maybe_parent` is a strict prefix directory of `path` — i.e.
/// `path` starts with `maybe_parent` followed by a `/`.
fn is_strict_prefix_dir(maybe_parent: &str, path: &str) -> bool {
    path.len() > maybe_parent.len() && path.starts_with(maybe_parent) && path.as_bytes()[maybe_parent.len()] == b'/'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(vendor: &str, destination: &str) -> MappingOwner {
        MappingOwner {
            vendor: vendor.to_string(),
            git_ref: "main".to_string(),
            destination: destination.to_string(),
        }
    }

    #[test]
    fn no_conflict_for_distinct_paths() {
        let owners = vec![owner("a", "pkg/a.go"), owner("b", "pkg/b.go")];
        assert!(detect_conflicts(&owners).is_ok());
    }

    #[test]
    fn exact_conflict_detected() {
        let owners = vec![owner("a", "pkg/shared.go"), owner("b", "pkg/shared.go")];
        assert!(matches!(detect_conflicts(&owners), Err(GitVendorError::PathConflict { .. })));
    }

    #[test]
    fn position_stripped_before_comparing() {
        let owners = vec![owner("a", "pkg/shared.go:L1-L5"), owner("b", "pkg/shared.go:L10-L20")];
        assert!(detect_conflicts(&owners).is_err());
    }

    #[test]
    fn structural_conflict_across_vendors() {
        let owners = vec![owner("a", "pkg/sub"), owner("b", "pkg/sub/file.go")];
        assert!(detect_conflicts(&owners).is_err());
    }

    #[test]
    fn structural_overlap_within_same_vendor_is_allowed() {
        let owners = vec![owner("a", "pkg/sub"), owner("a", "pkg/sub/file.go")];
        assert!(detect_conflicts(&owners).is_ok());
    }

    #[test]
    fn sibling_paths_are_not_structural_conflicts() {
        let owners = vec![owner("a", "pkg/subdir"), owner("b", "pkg/subdirectory/file.go")];
        assert!(detect_conflicts(&owners).is_ok());
    }
}
