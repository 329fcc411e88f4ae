//! Error types for the vendoring engine.
//!
//! [`GitVendorError`] enumerates every failure mode named in the error-kind
//! table (spec §7). Each variant carries the context a caller needs to
//! report the failure without re-deriving it — a vendor name, a path, the
//! line numbers of a merge conflict region, and so on.

use thiserror::Error;

/// The error type returned by every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum GitVendorError {
    /// Manifest failed to parse or failed structural validation.
    #[error("invalid manifest configuration: {reason}")]
    InvalidConfig {
        /// What about the manifest was invalid.
        reason: String,
    },

    /// Lockfile's `schema_version` major component exceeds what this build understands.
    #[error(
        "lockfile schema version {found} is newer than the highest version this build supports ({supported}); upgrade git-vendor"
    )]
    SchemaTooNew {
        /// The schema version recorded in the lockfile.
        found: String,
        /// The highest schema version this build accepts.
        supported: String,
    },

    /// The lockfile contains unresolved `<<<<<<<`/`=======`/`>>>>>>>` markers.
    #[error("lockfile has {count} unresolved merge conflict region(s), first at line {first_line}")]
    MergeConflict {
        /// Number of conflict regions detected.
        count: usize,
        /// 1-indexed line of the first `<<<<<<<` marker.
        first_line: usize,
        /// 1-indexed line of every `<<<<<<<` marker found.
        conflict_lines: Vec<usize>,
    },

    /// The internal-vendor mapping graph contains a cycle.
    #[error("circular internal vendor mapping detected: {cycle}")]
    CycleDetected {
        /// Human-readable `a -> b -> c -> a` rendering of the cycle.
        cycle: String,
    },

    /// Two or more mappings resolve to the same (or an overlapping) destination.
    #[error("path conflict at '{path}' between vendor '{vendor_a}' and vendor '{vendor_b}'")]
    PathConflict {
        /// The conflicting destination path.
        path: String,
        /// First owning vendor.
        vendor_a: String,
        /// Second owning vendor.
        vendor_b: String,
    },

    /// A destination path failed static validation.
    #[error("invalid destination path '{path}': {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A vendor name failed static validation.
    #[error("invalid vendor name '{name}': {reason}")]
    InvalidVendorName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Every candidate URL (primary + mirrors) failed to fetch.
    #[error("all {attempted} URL(s) failed to fetch for vendor '{vendor}'")]
    FetchExhausted {
        /// The vendor whose fetch was exhausted.
        vendor: String,
        /// Number of URLs attempted.
        attempted: usize,
        /// `(url, reason)` pairs for every failed attempt, in attempt order.
        reasons: Vec<(String, String)>,
    },

    /// The commit recorded in the lockfile is unreachable in the fetched history.
    #[error("locked commit {commit} for vendor '{vendor}' is unreachable; run update")]
    StaleCommit {
        /// The vendor whose locked commit is unreachable.
        vendor: String,
        /// The unreachable commit hash.
        commit: String,
    },

    /// A license policy decision or user refusal blocked the vendor.
    #[error("compliance check failed for vendor '{vendor}': {reason}")]
    ComplianceFailed {
        /// The vendor that failed compliance.
        vendor: String,
        /// Why compliance failed (deny decision, or user refusal).
        reason: String,
    },

    /// A URL uses a scheme outside the accepted safe-scheme set.
    #[error("unsafe URL scheme in '{url}': only https, http, git, ssh and scp-style are accepted")]
    UnsafeUrl {
        /// The rejected URL.
        url: String,
    },

    /// Auto-adjusting a position specifier after a propagation copy would invert the range.
    #[error("position auto-adjust would invert range for '{spec}' (shift {delta})")]
    PositionRangeInverted {
        /// The textual position specifier being adjusted.
        spec: String,
        /// The line-count delta that would have been applied.
        delta: i64,
    },

    /// A cancellation token was tripped mid-operation.
    #[error("operation cancelled")]
    Cancelled,

    /// A filesystem operation failed.
    #[error("filesystem error during {operation} at '{path}': {source}")]
    IoError {
        /// The operation being performed (e.g. "read", "write", "rename").
        operation: String,
        /// The path involved.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An external VCS client invocation failed.
    #[error("git operation '{operation}' failed: {stderr}")]
    VcsError {
        /// The git subcommand that failed (e.g. "clone", "fetch", "checkout").
        operation: String,
        /// Captured stderr from the subprocess.
        stderr: String,
    },

    /// A catch-all for conditions not covered by a more specific variant.
    #[error("{message}")]
    Other {
        /// Free-form description.
        message: String,
    },
}

impl GitVendorError {
    /// Wraps a [`std::io::Error`] with operation/path context.
    pub fn io(operation: impl Into<String>, path: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_conflict_reports_first_line() {
        let err = GitVendorError::MergeConflict {
            count: 2,
            first_line: 3,
            conflict_lines: vec![3, 40],
        };
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn fetch_exhausted_carries_all_reasons() {
        let err = GitVendorError::FetchExhausted {
            vendor: "lib-a".into(),
            attempted: 2,
            reasons: vec![
                ("https://a".into(), "timeout".into()),
                ("https://b".into(), "auth failed".into()),
            ],
        };
        if let GitVendorError::FetchExhausted {
            reasons,
            ..
        } = &err
        {
            assert_eq!(reasons.len(), 2);
        } else {
            panic!("wrong variant");
        }
    }
}
