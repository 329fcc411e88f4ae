//! The abstract version-control client (spec §6).
//!
//! The core never shells out directly; every git interaction goes through
//! the [`VcsClient`] trait so the sync and drift pipelines can be tested
//! against a fake. [`git::GitVcsClient`] is the production implementation,
//! wrapping the system `git` binary the way the teacher's `GitRepo`
//! wraps it (async, one `tokio::process::Command` per operation).

pub mod command_builder;
pub mod git;

use std::path::Path;

use crate::core::{CancellationToken, GitVendorError};

/// Whether a checkout failure was because the target commit/ref is
/// unreachable (surfaces as [`GitVendorError::StaleCommit`]) or some
/// other git failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutFailureKind {
    /// The target is not present in the fetched history.
    Unreachable,
    /// Any other git failure (dirty tree, corrupt repo, …).
    Other,
}

/// A single fetched commit's tree entry, as returned by `ListTree`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the repository root.
    pub path: String,
    /// Whether this entry is a directory (tree) rather than a blob.
    pub is_dir: bool,
}

/// The abstract VCS client contract named in spec §6. Every operation
/// accepts a cancellation token per §5.
///
/// Implementations are injected generically (`impl VcsClient` / `<V:
/// VcsClient>`) rather than through a trait object, per the design note
/// that interface dispatch may use "trait objects, sum types... or
/// generic parameters" — generics keep every method a plain `async fn`
/// with no boxed-future indirection.
pub trait VcsClient: Send + Sync {
    /// Clones `url` into a fresh repository at `target`.
    async fn clone_repo(&self, url: &str, target: &Path, token: &CancellationToken) -> Result<(), GitVendorError>;

    /// Initializes an empty repository at `target`.
    async fn init(&self, target: &Path) -> Result<(), GitVendorError>;

    /// Adds (or replaces) the `origin` remote.
    async fn add_remote(&self, repo: &Path, name: &str, url: &str) -> Result<(), GitVendorError>;

    /// Rewrites an existing remote's URL.
    async fn set_remote_url(&self, repo: &Path, name: &str, url: &str) -> Result<(), GitVendorError>;

    /// Fetches `git_ref` at the given depth (`None` = full history).
    async fn fetch(
        &self,
        repo: &Path,
        git_ref: &str,
        depth: Option<u32>,
        token: &CancellationToken,
    ) -> Result<(), GitVendorError>;

    /// Fetches every ref from every configured remote.
    async fn fetch_all(&self, repo: &Path, token: &CancellationToken) -> Result<(), GitVendorError>;

    /// Checks out `target` (a ref or commit) in the working tree.
    async fn checkout(&self, repo: &Path, target: &str) -> Result<(), GitVendorError>;

    /// Returns the current `HEAD` commit hash.
    async fn get_head_hash(&self, repo: &Path) -> Result<String, GitVendorError>;

    /// Lists the working tree, honoring `.git` exclusion.
    async fn list_tree(&self, repo: &Path) -> Result<Vec<TreeEntry>, GitVendorError>;

    /// Queries `url` for the commit `git_ref` resolves to, without a full
    /// clone. Carries the §5 default 30s timeout.
    async fn ls_remote(&self, url: &str, git_ref: &str) -> Result<Option<String>, GitVendorError>;
}

#[cfg(any(test, feature = "test-utils"))]
pub mod fake {
    //! A deterministic in-memory [`VcsClient`] for tests, grounded on the
    //! teacher's own `test_utils` module convention of exposing
    //! construction helpers behind the `test-utils` feature.
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A fake VCS client backed entirely by in-memory state — no subprocess,
    /// no filesystem beyond what the caller stages.
    #[derive(Default)]
    pub struct FakeVcsClient {
        /// url -> (ref -> commit hash)
        pub remote_refs: Mutex<HashMap<String, HashMap<String, String>>>,
        /// repo path -> current head hash
        pub heads: Mutex<HashMap<String, String>>,
        pub fail_clone_urls: Mutex<Vec<String>>,
        /// Relative path -> content, materialized into the working tree on
        /// `checkout`, so callers can exercise a full sync pipeline without
        /// a real upstream.
        pub seed_files: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl VcsClient for FakeVcsClient {
        async fn clone_repo(&self, url: &str, target: &Path, _token: &CancellationToken) -> Result<(), GitVendorError> {
            if self.fail_clone_urls.lock().unwrap().contains(&url.to_string()) {
                return Err(GitVendorError::VcsError {
                    operation: "clone".into(),
                    stderr: format!("simulated failure for {url}"),
                });
            }
            std::fs::create_dir_all(target).map_err(|e| GitVendorError::io("mkdir", target.display().to_string(), e))?;
            Ok(())
        }

        async fn init(&self, target: &Path) -> Result<(), GitVendorError> {
            std::fs::create_dir_all(target).map_err(|e| GitVendorError::io("mkdir", target.display().to_string(), e))
        }

        async fn add_remote(&self, _repo: &Path, _name: &str, _url: &str) -> Result<(), GitVendorError> {
            Ok(())
        }

        async fn set_remote_url(&self, _repo: &Path, _name: &str, _url: &str) -> Result<(), GitVendorError> {
            Ok(())
        }

        async fn fetch(
            &self,
            _repo: &Path,
            _git_ref: &str,
            _depth: Option<u32>,
            _token: &CancellationToken,
        ) -> Result<(), GitVendorError> {
            Ok(())
        }

        async fn fetch_all(&self, _repo: &Path, _token: &CancellationToken) -> Result<(), GitVendorError> {
            Ok(())
        }

        async fn checkout(&self, repo: &Path, target: &str) -> Result<(), GitVendorError> {
            self.heads.lock().unwrap().insert(repo.display().to_string(), target.to_string());
            for (relative, content) in self.seed_files.lock().unwrap().iter() {
                let full = repo.join(relative);
                if let Some(parent) = full.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| GitVendorError::io("mkdir", parent.display().to_string(), e))?;
                }
                std::fs::write(&full, content).map_err(|e| GitVendorError::io("write", full.display().to_string(), e))?;
            }
            Ok(())
        }

        async fn get_head_hash(&self, repo: &Path) -> Result<String, GitVendorError> {
            Ok(self
                .heads
                .lock()
                .unwrap()
                .get(&repo.display().to_string())
                .cloned()
                .unwrap_or_else(|| "0000000".to_string()))
        }

        async fn list_tree(&self, repo: &Path) -> Result<Vec<TreeEntry>, GitVendorError> {
            let mut entries = Vec::new();
            for entry in walkdir::WalkDir::new(repo).into_iter().filter_map(std::result::Result::ok) {
                if entry.path() == repo {
                    continue;
                }
                let rel = entry.path().strip_prefix(repo).unwrap();
                if rel.components().next().map(|c| c.as_os_str() == ".git").unwrap_or(false) {
                    continue;
                }
                entries.push(TreeEntry {
                    path: rel.to_string_lossy().replace('\\', "/"),
                    is_dir: entry.file_type().is_dir(),
                });
            }
            Ok(entries)
        }

        async fn ls_remote(&self, url: &str, git_ref: &str) -> Result<Option<String>, GitVendorError> {
            Ok(self.remote_refs.lock().unwrap().get(url).and_then(|refs| refs.get(git_ref).cloned()))
        }
    }
}
