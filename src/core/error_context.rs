//! User-facing presentation wrapper around [`GitVendorError`].
//!
//! The engine itself never renders to a terminal (that is a CLI concern,
//! out of scope per spec §1); [`ErrorContext`] exists so a future CLI layer
//! has a ready-made place to hang a suggestion and extra detail without
//! re-deriving them from the typed error.

use std::fmt;

use super::error::GitVendorError;

/// Wraps a [`GitVendorError`] with an optional suggestion and extra detail.
#[derive(Debug)]
pub struct ErrorContext {
    error: GitVendorError,
    suggestion: Option<String>,
    details: Option<String>,
}

impl ErrorContext {
    /// Creates a context around the given error with no suggestion or detail yet.
    pub fn new(error: GitVendorError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attaches an actionable suggestion (e.g. "run update").
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attaches extra explanatory detail.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Returns the wrapped error.
    pub fn error(&self) -> &GitVendorError {
        &self.error
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.error)?;
        if let Some(details) = &self.details {
            writeln!(f, "  {details}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            writeln!(f, "  suggestion: {suggestion}")?;
        }
        Ok(())
    }
}

/// Attaches the standard suggestion for each error variant, the way the
/// eventual CLI layer would want to display it.
pub fn user_friendly_error(error: GitVendorError) -> ErrorContext {
    let ctx = ErrorContext::new(match &error {
        GitVendorError::StaleCommit {
            ..
        } => error,
        _ => error,
    });
    match ctx.error() {
        GitVendorError::StaleCommit {
            ..
        } => ctx.with_suggestion("run `git-vendor update` to refresh the locked commit"),
        GitVendorError::SchemaTooNew {
            ..
        } => ctx.with_suggestion("upgrade git-vendor to a version that understands this schema"),
        GitVendorError::MergeConflict {
            ..
        } => ctx.with_suggestion("resolve the conflict markers in vendor.lock, or run a lock merge"),
        GitVendorError::ComplianceFailed {
            ..
        } => ctx.with_suggestion("adjust the license policy or remove the offending vendor"),
        _ => ctx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_suggestion() {
        let ctx = user_friendly_error(GitVendorError::StaleCommit {
            vendor: "lib-a".into(),
            commit: "deadbee".into(),
        });
        let rendered = ctx.to_string();
        assert!(rendered.contains("run `git-vendor update`"));
    }
}
