//! The confirmation collaborator (spec §6): `Ask(title, body) -> bool`,
//! used for `warn`-class license decisions (§4.7). Suspension point per
//! §5, so every implementation accepts a cancellation token.

use crate::core::{CancellationToken, GitVendorError};

/// Asks the user to accept or refuse a `warn`-class license decision.
pub trait Confirm: Send + Sync {
    /// Presents `title`/`body` and returns the user's choice. A refusal is
    /// not itself an error; callers turn `Ok(false)` into
    /// [`GitVendorError::ComplianceFailed`].
    async fn ask(&self, title: &str, body: &str, token: &CancellationToken) -> Result<bool, GitVendorError>;
}

/// Always accepts, without prompting. For tests and non-interactive runs
/// that have decided to trust `warn`-class licenses.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysAccept;

impl Confirm for AlwaysAccept {
    async fn ask(&self, _title: &str, _body: &str, token: &CancellationToken) -> Result<bool, GitVendorError> {
        token.check()?;
        Ok(true)
    }
}

/// Always refuses, without prompting. The safe default for CI, where a
/// `warn`-class license should never pass silently.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysRefuse;

impl Confirm for AlwaysRefuse {
    async fn ask(&self, _title: &str, _body: &str, token: &CancellationToken) -> Result<bool, GitVendorError> {
        token.check()?;
        Ok(false)
    }
}

/// Placeholder for a real terminal prompt. Interactive I/O is a CLI
/// concern outside this crate's scope (spec §1); this stub exists so
/// callers have a named type to reach for, but it always cancels rather
/// than silently guessing the user's intent.
#[derive(Debug, Default, Clone, Copy)]
pub struct Interactive;

impl Confirm for Interactive {
    async fn ask(&self, _title: &str, _body: &str, _token: &CancellationToken) -> Result<bool, GitVendorError> {
        Err(GitVendorError::Other {
            message: "interactive confirmation is not implemented in this library; supply a Confirm impl".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_accept_returns_true() {
        let token = CancellationToken::new();
        assert!(AlwaysAccept.ask("t", "b", &token).await.unwrap());
    }

    #[tokio::test]
    async fn always_refuse_returns_false() {
        let token = CancellationToken::new();
        assert!(!AlwaysRefuse.ask("t", "b", &token).await.unwrap());
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_always_accept() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(AlwaysAccept.ask("t", "b", &token).await, Err(GitVendorError::Cancelled)));
    }

    #[tokio::test]
    async fn interactive_stub_errors() {
        let token = CancellationToken::new();
        assert!(Interactive.ask("t", "b", &token).await.is_err());
    }
}
