//! The hook runner collaborator (spec §6): executes a user-supplied shell
//! command string in the project root, opaque to the core beyond
//! success/failure. Run only for external vendors, as the last sync step
//! (§4.3 step 10).
//!
//! Grounded on [`crate::vcs::command_builder::GitCommand`]'s
//! cancellation-aware subprocess handling, but dispatched through the
//! platform shell since the command is an arbitrary user string rather
//! than a fixed argv.

use std::path::Path;

use tokio::process::Command;

use crate::core::{CancellationToken, GitVendorError};

/// Runs a post-sync hook command.
pub trait HookRunner: Send + Sync {
    /// Executes `command` with `cwd` as its working directory. A non-zero
    /// exit is reported as [`GitVendorError::Other`]; the hook's stdout
    /// and stderr are not otherwise interpreted.
    async fn run(&self, command: &str, cwd: &Path, token: &CancellationToken) -> Result<(), GitVendorError>;
}

/// Executes hooks via the platform shell (`sh -c` on Unix, `cmd /C` on
/// Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellHookRunner;

impl HookRunner for ShellHookRunner {
    async fn run(&self, command: &str, cwd: &Path, token: &CancellationToken) -> Result<(), GitVendorError> {
        token.check()?;

        let mut process = shell_command(command);
        process.current_dir(cwd).kill_on_drop(true);

        let output = process
            .output()
            .await
            .map_err(|e| GitVendorError::io("spawn hook", command.to_string(), e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(GitVendorError::Other {
                message: format!(
                    "hook '{command}' exited with status {status}: {stderr}",
                    status = output.status,
                    stderr = String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut process = Command::new("sh");
    process.arg("-c").arg(command);
    process
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut process = Command::new("cmd");
    process.arg("/C").arg(command);
    process
}

/// Never runs anything; the safe default when `hooks` execution has not
/// been opted into.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHookRunner;

impl HookRunner for NoopHookRunner {
    async fn run(&self, _command: &str, _cwd: &Path, token: &CancellationToken) -> Result<(), GitVendorError> {
        token.check()
    }
}
