//! Manifest validation (spec §3 invariants, §7 `InvalidConfig`/`UnsafeUrl`).

use std::collections::HashSet;

use crate::constants::INTERNAL_REF_SENTINEL;
use crate::core::GitVendorError;
use crate::fs::{validate_dest_path, validate_vendor_name};
use crate::source::validate_url_scheme;

use super::{Manifest, SourceKind, VendorSpec};

/// Validates a complete manifest: every vendor, and uniqueness of vendor
/// names. Does not check cross-manifest path conflicts or cycles — those
/// are [`crate::mapping::conflict`] and [`crate::mapping::cycle`]
/// concerns that need the whole manifest's auto-computed paths.
pub fn validate_manifest(manifest: &Manifest) -> Result<(), GitVendorError> {
    let mut seen_names = HashSet::new();
    for vendor in &manifest.vendors {
        validate_vendor(vendor)?;
        if !seen_names.insert(vendor.name.clone()) {
            return Err(GitVendorError::InvalidConfig {
                reason: format!("duplicate vendor name '{}'", vendor.name),
            });
        }
    }
    Ok(())
}

/// Validates a single [`VendorSpec`] in isolation.
pub fn validate_vendor(vendor: &VendorSpec) -> Result<(), GitVendorError> {
    validate_vendor_name(&vendor.name)?;

    if vendor.specs.is_empty() {
        return Err(GitVendorError::InvalidConfig {
            reason: format!("vendor '{}' must declare at least one spec", vendor.name),
        });
    }

    match vendor.source {
        SourceKind::External => validate_external(vendor)?,
        SourceKind::Internal => validate_internal(vendor)?,
    }

    for spec in &vendor.specs {
        if spec.mapping.is_empty() {
            return Err(GitVendorError::InvalidConfig {
                reason: format!(
                    "vendor '{}' ref '{}' must declare at least one mapping",
                    vendor.name, spec.git_ref
                ),
            });
        }
        for entry in &spec.mapping {
            let mapping = entry.clone().into_mapping();
            if mapping.from.is_empty() {
                return Err(GitVendorError::InvalidConfig {
                    reason: format!("vendor '{}' has a mapping with an empty 'from'", vendor.name),
                });
            }
            if !mapping.to.is_empty() && mapping.to != "." {
                validate_dest_path(&mapping.to)?;
            }
        }
    }

    Ok(())
}

fn validate_external(vendor: &VendorSpec) -> Result<(), GitVendorError> {
    let Some(url) = &vendor.url else {
        return Err(GitVendorError::InvalidConfig {
            reason: format!("external vendor '{}' must declare a 'url'", vendor.name),
        });
    };
    validate_url_scheme(url)?;

    let mut seen = HashSet::new();
    seen.insert(url.clone());
    for mirror in &vendor.mirrors {
        validate_url_scheme(mirror)?;
        if mirror == url {
            return Err(GitVendorError::InvalidConfig {
                reason: format!("vendor '{}' mirror '{}' duplicates the primary url", vendor.name, mirror),
            });
        }
        if !seen.insert(mirror.clone()) {
            return Err(GitVendorError::InvalidConfig {
                reason: format!("vendor '{}' declares mirror '{}' more than once", vendor.name, mirror),
            });
        }
    }

    for spec in &vendor.specs {
        if spec.git_ref == INTERNAL_REF_SENTINEL {
            return Err(GitVendorError::InvalidConfig {
                reason: format!(
                    "vendor '{}' is external but uses the internal sentinel ref '{INTERNAL_REF_SENTINEL}'",
                    vendor.name
                ),
            });
        }
    }
    Ok(())
}

fn validate_internal(vendor: &VendorSpec) -> Result<(), GitVendorError> {
    if vendor.url.is_some() {
        return Err(GitVendorError::InvalidConfig {
            reason: format!("internal vendor '{}' must not declare a 'url'", vendor.name),
        });
    }
    if !vendor.mirrors.is_empty() {
        return Err(GitVendorError::InvalidConfig {
            reason: format!("internal vendor '{}' must not declare mirrors", vendor.name),
        });
    }
    if vendor.hooks.is_some() {
        return Err(GitVendorError::InvalidConfig {
            reason: format!("internal vendor '{}' must not declare hooks", vendor.name),
        });
    }
    for spec in &vendor.specs {
        if spec.git_ref != INTERNAL_REF_SENTINEL {
            return Err(GitVendorError::InvalidConfig {
                reason: format!(
                    "internal vendor '{}' spec must use ref '{INTERNAL_REF_SENTINEL}', found '{}'",
                    vendor.name, spec.git_ref
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{BranchSpec, MappingEntry};

    fn external_vendor() -> VendorSpec {
        VendorSpec {
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
                mapping: vec![MappingEntry::Shorthand("src/util.go".into())],
            }],
            hooks: None,
        }
    }

    #[test]
    fn valid_external_vendor_passes() {
        assert!(validate_vendor(&external_vendor()).is_ok());
    }

    #[test]
    fn external_without_url_fails() {
        let mut v = external_vendor();
        v.url = None;
        assert!(validate_vendor(&v).is_err());
    }

    #[test]
    fn unsafe_scheme_rejected() {
        let mut v = external_vendor();
        v.url = Some("file:///etc/passwd".into());
        assert!(matches!(validate_vendor(&v), Err(GitVendorError::UnsafeUrl { .. })));
    }

    #[test]
    fn duplicate_mirror_rejected() {
        let mut v = external_vendor();
        v.mirrors = vec!["https://mirror.example/lib-a".into(), "https://mirror.example/lib-a".into()];
        assert!(validate_vendor(&v).is_err());
    }

    #[test]
    fn mirror_matching_primary_rejected() {
        let mut v = external_vendor();
        v.mirrors = vec![v.url.clone().unwrap()];
        assert!(validate_vendor(&v).is_err());
    }

    #[test]
    fn internal_vendor_requires_local_sentinel() {
        let mut v = external_vendor();
        v.source = SourceKind::Internal;
        v.url = None;
        assert!(validate_vendor(&v).is_err());
        v.specs[0].git_ref = "local".into();
        assert!(validate_vendor(&v).is_ok());
    }

    #[test]
    fn empty_mapping_list_rejected() {
        let mut v = external_vendor();
        v.specs[0].mapping.clear();
        assert!(validate_vendor(&v).is_err());
    }
}
