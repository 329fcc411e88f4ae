//! Production [`VcsClient`] wrapping the system `git` binary.

use std::path::Path;

use tracing::instrument;

use crate::constants::LS_REMOTE_TIMEOUT_SECS;
use crate::core::{CancellationToken, GitVendorError};

use super::command_builder::GitCommand;
use super::{TreeEntry, VcsClient};

/// Uses system git (not a linked library) for maximum compatibility with
/// authentication, credential helpers, and platform-specific
/// configuration — the same rationale as the teacher's `GitRepo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitVcsClient;

impl VcsClient for GitVcsClient {
    #[instrument(skip(self, token))]
    async fn clone_repo(&self, url: &str, target: &Path, token: &CancellationToken) -> Result<(), GitVendorError> {
        let cmd = if url.starts_with("file://") {
            GitCommand::clone_local(url, target)
        } else {
            GitCommand::clone(url, target)
        };
        cmd.execute(token).await?;
        Ok(())
    }

    async fn init(&self, target: &Path) -> Result<(), GitVendorError> {
        let token = CancellationToken::new();
        GitCommand::init(target).execute(&token).await?;
        Ok(())
    }

    async fn add_remote(&self, repo: &Path, name: &str, url: &str) -> Result<(), GitVendorError> {
        let token = CancellationToken::new();
        GitCommand::add_remote(name, url).current_dir(repo).execute(&token).await?;
        Ok(())
    }

    async fn set_remote_url(&self, repo: &Path, _name: &str, url: &str) -> Result<(), GitVendorError> {
        let token = CancellationToken::new();
        GitCommand::set_remote_url(url).current_dir(repo).execute(&token).await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn fetch(
        &self,
        repo: &Path,
        git_ref: &str,
        depth: Option<u32>,
        token: &CancellationToken,
    ) -> Result<(), GitVendorError> {
        GitCommand::fetch("origin", git_ref, depth).current_dir(repo).execute(token).await?;
        Ok(())
    }

    async fn fetch_all(&self, repo: &Path, token: &CancellationToken) -> Result<(), GitVendorError> {
        GitCommand::fetch_all("origin").current_dir(repo).execute(token).await?;
        Ok(())
    }

    async fn checkout(&self, repo: &Path, target: &str) -> Result<(), GitVendorError> {
        let token = CancellationToken::new();
        let result = GitCommand::checkout(target).current_dir(repo).execute(&token).await;
        result.map(|_| ()).map_err(|e| annotate_stale_commit(e, target))
    }

    async fn get_head_hash(&self, repo: &Path) -> Result<String, GitVendorError> {
        let token = CancellationToken::new();
        GitCommand::rev_parse_head().current_dir(repo).execute(&token).await
    }

    async fn list_tree(&self, repo: &Path) -> Result<Vec<TreeEntry>, GitVendorError> {
        let mut entries = Vec::new();
        for entry in walkdir::WalkDir::new(repo).into_iter().filter_map(std::result::Result::ok) {
            if entry.path() == repo {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(repo)
                .map_err(|_| GitVendorError::Other {
                    message: "tree entry outside repository root".to_string(),
                })?;
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
        let token = CancellationToken::new();
        let future = GitCommand::ls_remote(url, git_ref).execute(&token);
        let output = match tokio::time::timeout(std::time::Duration::from_secs(LS_REMOTE_TIMEOUT_SECS), future).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(GitVendorError::VcsError {
                    operation: "ls-remote".into(),
                    stderr: format!("timed out after {LS_REMOTE_TIMEOUT_SECS}s"),
                });
            }
        };
        Ok(output.split_whitespace().next().map(str::to_string))
    }
}

/// `git checkout` of an unreachable commit fails with a git-specific
/// message; this turns that failure into the diagnostic spec §7 names
/// (`StaleCommit`) rather than a bare `VcsError`.
fn annotate_stale_commit(error: GitVendorError, target: &str) -> GitVendorError {
    match &error {
        GitVendorError::VcsError {
            stderr,
            ..
        } if stderr.contains("did not match any") || stderr.contains("unknown revision") => {
            GitVendorError::StaleCommit {
                vendor: String::new(),
                commit: target.to_string(),
            }
        }
        _ => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_creates_a_repository() {
        let client = GitVcsClient;
        let dir = tempfile::tempdir().unwrap();
        client.init(dir.path()).await.unwrap();
        assert!(dir.path().join(".git").exists());
    }

    #[test]
    fn unreachable_checkout_message_becomes_stale_commit() {
        let err = GitVendorError::VcsError {
            operation: "checkout".into(),
            stderr: "error: pathspec 'deadbee' did not match any file(s) known to git".into(),
        };
        let annotated = annotate_stale_commit(err, "deadbee");
        assert!(matches!(annotated, GitVendorError::StaleCommit { .. }));
    }

    #[test]
    fn ordinary_checkout_failure_is_left_alone() {
        let err = GitVendorError::VcsError {
            operation: "checkout".into(),
            stderr: "error: your local changes would be overwritten".into(),
        };
        let annotated = annotate_stale_commit(err, "main");
        assert!(matches!(annotated, GitVendorError::VcsError { .. }));
    }
}
