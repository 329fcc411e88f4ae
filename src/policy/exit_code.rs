//! Exit-code derivation from per-vendor drift and enforcement (spec §4.7).

use std::collections::HashMap;

use crate::manifest::Enforcement;

/// The three process exit codes this engine ever reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// No unacknowledged drift under strict or lenient enforcement.
    Pass = 0,
    /// A strict vendor has unacknowledged drift.
    Fail = 1,
    /// A lenient vendor has unacknowledged drift, no strict vendor does.
    Warn = 2,
}

impl ExitCode {
    /// The numeric process exit status.
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Per-vendor counts feeding exit-code derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct VendorDriftCounts {
    pub modified: usize,
    pub deleted: usize,
}

impl VendorDriftCounts {
    /// "Unacknowledged drift" per spec §4.7: modified + deleted files.
    pub fn unacknowledged(&self) -> usize {
        self.modified + self.deleted
    }
}

/// Derives the final [`ExitCode`] from per-vendor drift counts and the
/// enforcement level actually in effect for each vendor (i.e. after
/// [`super::resolve_enforcement`], including any `mode=override`).
///
/// `pre_override_would_fail` is the same strict-vendor check computed
/// against enforcement as it would resolve under `mode=default` (per-vendor
/// settings honored, ignoring any global override) — the "original
/// result" spec §4.7's override rule refers to. When `mode=override` has
/// downgraded every vendor to a non-strict level, this still preserves a
/// FAIL verdict if `stale_count` is non-zero and that original check would
/// have failed.
pub fn derive(
    drift: &HashMap<String, VendorDriftCounts>,
    enforcement: &HashMap<String, Enforcement>,
    stale_count: usize,
    pre_override_would_fail: bool,
) -> ExitCode {
    let strict_fail = drift.iter().any(|(name, counts)| {
        enforcement.get(name).copied().unwrap_or(Enforcement::Lenient) == Enforcement::Strict
            && counts.unacknowledged() > 0
    });

    if strict_fail || (stale_count > 0 && pre_override_would_fail) {
        return ExitCode::Fail;
    }

    let lenient_warn = drift.iter().any(|(name, counts)| {
        enforcement.get(name).copied().unwrap_or(Enforcement::Lenient) == Enforcement::Lenient
            && counts.unacknowledged() > 0
    });
    if lenient_warn {
        return ExitCode::Warn;
    }

    ExitCode::Pass
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_run_passes() {
        let drift = HashMap::new();
        let enforcement = HashMap::new();
        assert_eq!(derive(&drift, &enforcement, 0, false), ExitCode::Pass);
    }

    #[test]
    fn strict_vendor_with_drift_fails() {
        let mut drift = HashMap::new();
        drift.insert(
            "lib-a".to_string(),
            VendorDriftCounts {
                modified: 1,
                deleted: 0,
            },
        );
        let mut enforcement = HashMap::new();
        enforcement.insert("lib-a".to_string(), Enforcement::Strict);
        assert_eq!(derive(&drift, &enforcement, 0, true), ExitCode::Fail);
    }

    #[test]
    fn lenient_vendor_with_drift_warns() {
        let mut drift = HashMap::new();
        drift.insert(
            "lib-a".to_string(),
            VendorDriftCounts {
                modified: 0,
                deleted: 1,
            },
        );
        let mut enforcement = HashMap::new();
        enforcement.insert("lib-a".to_string(), Enforcement::Lenient);
        assert_eq!(derive(&drift, &enforcement, 0, false), ExitCode::Warn);
    }

    #[test]
    fn info_vendor_with_drift_never_affects_code() {
        let mut drift = HashMap::new();
        drift.insert(
            "lib-a".to_string(),
            VendorDriftCounts {
                modified: 3,
                deleted: 0,
            },
        );
        let mut enforcement = HashMap::new();
        enforcement.insert("lib-a".to_string(), Enforcement::Info);
        assert_eq!(derive(&drift, &enforcement, 0, false), ExitCode::Pass);
    }

    #[test]
    fn two_vendor_override_scenario_from_spec_example_six() {
        let mut drift = HashMap::new();
        drift.insert(
            "strict-vendor".to_string(),
            VendorDriftCounts {
                modified: 1,
                deleted: 0,
            },
        );
        drift.insert("lenient-vendor".to_string(), VendorDriftCounts::default());

        let mut enforcement = HashMap::new();
        enforcement.insert("strict-vendor".to_string(), Enforcement::Strict);
        enforcement.insert("lenient-vendor".to_string(), Enforcement::Lenient);
        assert_eq!(derive(&drift, &enforcement, 0, true), ExitCode::Fail);

        let mut overridden = HashMap::new();
        overridden.insert("strict-vendor".to_string(), Enforcement::Info);
        overridden.insert("lenient-vendor".to_string(), Enforcement::Info);
        assert_eq!(derive(&drift, &overridden, 0, true), ExitCode::Pass);
    }

    #[test]
    fn stale_overrides_a_downgraded_fail() {
        let mut drift = HashMap::new();
        drift.insert(
            "lib-a".to_string(),
            VendorDriftCounts {
                modified: 1,
                deleted: 0,
            },
        );
        let mut enforcement = HashMap::new();
        enforcement.insert("lib-a".to_string(), Enforcement::Info);
        assert_eq!(derive(&drift, &enforcement, 2, true), ExitCode::Fail);
    }

    #[test]
    fn stale_alone_does_not_fail_when_original_would_not_have_failed() {
        let drift = HashMap::new();
        let enforcement = HashMap::new();
        assert_eq!(derive(&drift, &enforcement, 3, false), ExitCode::Pass);
    }
}
