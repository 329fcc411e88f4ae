//! `git` subprocess argv assembly and cancellation-aware execution.
//!
//! Grounded on the teacher's `GitCommand` builder
//! (`src/git/command_builder.rs`): one small builder type per invocation,
//! assembled with explicit argument vectors (never a shell string) to
//! rule out command injection, and a single `execute` entry point that
//! maps a non-zero exit to [`GitVendorError::VcsError`].

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use tokio::process::Command;

use crate::core::{CancellationToken, GitVendorError};

/// A single `git` invocation under construction.
pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    operation: String,
}

impl GitCommand {
    fn new(operation: &str, args: Vec<String>) -> Self {
        Self {
            args,
            current_dir: None,
            operation: operation.to_string(),
        }
    }

    /// Sets the working directory the subprocess runs in.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn init(target: &Path) -> Self {
        Self::new("init", vec!["init".into(), "--quiet".into(), target.display().to_string()])
    }

    pub fn clone(url: &str, target: &Path) -> Self {
        Self::new("clone", vec!["clone".into(), "--quiet".into(), url.into(), target.display().to_string()])
    }

    pub fn clone_local(url: &str, target: &Path) -> Self {
        Self::new(
            "clone",
            vec!["clone".into(), "--quiet".into(), "--no-hardlinks".into(), url.into(), target.display().to_string()],
        )
    }

    pub fn add_remote(name: &str, url: &str) -> Self {
        Self::new("remote-add", vec!["remote".into(), "add".into(), name.into(), url.into()])
    }

    pub fn set_remote_url(url: &str) -> Self {
        Self::new("remote-set-url", vec!["remote".into(), "set-url".into(), "origin".into(), url.into()])
    }

    pub fn fetch(remote: &str, git_ref: &str, depth: Option<u32>) -> Self {
        let mut args = vec!["fetch".into(), "--quiet".into()];
        if let Some(depth) = depth {
            args.push("--depth".into());
            args.push(depth.to_string());
        }
        args.push(remote.into());
        args.push(git_ref.into());
        Self::new("fetch", args)
    }

    pub fn fetch_all(remote: &str) -> Self {
        Self::new("fetch-all", vec!["fetch".into(), "--quiet".into(), "--all".into(), "--tags".into(), remote.into()])
    }

    pub fn checkout(target: &str) -> Self {
        Self::new("checkout", vec!["checkout".into(), "--quiet".into(), target.into()])
    }

    pub fn rev_parse_head() -> Self {
        Self::new("rev-parse", vec!["rev-parse".into(), "HEAD".into()])
    }

    pub fn cat_file_exists(commit: &str) -> Self {
        Self::new("cat-file", vec!["cat-file".into(), "-e".into(), commit.into()])
    }

    pub fn ls_remote(url: &str, git_ref: &str) -> Self {
        Self::new("ls-remote", vec!["ls-remote".into(), url.into(), git_ref.into()])
    }

    /// Executes the command, returning the raw process output regardless
    /// of exit status.
    pub async fn execute_raw(self, token: &CancellationToken) -> Result<Output, GitVendorError> {
        token.check()?;

        let mut command = Command::new("git");
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command.kill_on_drop(true);

        let mut child = command
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| GitVendorError::io("spawn git", self.operation.clone(), e))?;

        loop {
            tokio::select! {
                result = child.wait() => {
                    let status = result.map_err(|e| GitVendorError::io("wait git", self.operation.clone(), e))?;
                    let stdout = read_to_string(child.stdout.take()).await;
                    let stderr = read_to_string(child.stderr.take()).await;
                    return Ok(Output { status, stdout: stdout.into_bytes(), stderr: stderr.into_bytes() });
                }
                () = tokio::time::sleep(Duration::from_millis(100)) => {
                    if token.is_cancelled() {
                        let _ = child.start_kill();
                        return Err(GitVendorError::Cancelled);
                    }
                }
            }
        }
    }

    /// Executes the command and maps a non-zero exit to
    /// [`GitVendorError::VcsError`], returning trimmed stdout on success.
    pub async fn execute(self, token: &CancellationToken) -> Result<String, GitVendorError> {
        let operation = self.operation.clone();
        let output = self.execute_raw(token).await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(GitVendorError::VcsError {
                operation,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

async fn read_to_string(pipe: Option<impl tokio::io::AsyncRead + Unpin>) -> String {
    use tokio::io::AsyncReadExt;
    let Some(mut pipe) = pipe else {
        return String::new();
    };
    let mut buf = String::new();
    let _ = pipe.read_to_string(&mut buf).await;
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_with_depth_includes_depth_flag() {
        let cmd = GitCommand::fetch("origin", "main", Some(1));
        assert!(cmd.args.contains(&"--depth".to_string()));
        assert!(cmd.args.contains(&"1".to_string()));
    }

    #[test]
    fn fetch_without_depth_omits_depth_flag() {
        let cmd = GitCommand::fetch("origin", "main", None);
        assert!(!cmd.args.contains(&"--depth".to_string()));
    }

    #[tokio::test]
    async fn cancelled_token_aborts_before_spawn() {
        let token = CancellationToken::new();
        token.cancel();
        let result = GitCommand::rev_parse_head().execute(&token).await;
        assert!(matches!(result, Err(GitVendorError::Cancelled)));
    }
}
