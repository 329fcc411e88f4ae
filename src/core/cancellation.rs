//! Cooperative cancellation token.
//!
//! Every long-running operation (VCS subprocess invocation, large tree
//! copy, the confirmation collaborator) accepts a [`CancellationToken`]
//! and must check it between vendors and between major phases (spec §5).
//! Checking is cooperative: nothing pre-empts a running subprocess, but
//! the pipeline will not start the next phase once tripped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::error::GitVendorError;

/// A cheaply cloneable, shareable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    tripped: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a fresh, untripped token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the token. Idempotent.
    pub fn cancel(&self) {
        self.tripped.store(true, Ordering::SeqCst);
    }

    /// Returns whether the token has been tripped.
    pub fn is_cancelled(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    /// Returns `Err(GitVendorError::Cancelled)` if tripped, `Ok(())` otherwise.
    ///
    /// Call this between vendors and between major sync phases.
    pub fn check(&self) -> Result<(), GitVendorError> {
        if self.is_cancelled() {
            Err(GitVendorError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let token = CancellationToken::new();
        assert!(token.check().is_ok());
    }

    #[test]
    fn cancelled_token_errors() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(token.check(), Err(GitVendorError::Cancelled)));
    }

    #[test]
    fn clone_shares_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
