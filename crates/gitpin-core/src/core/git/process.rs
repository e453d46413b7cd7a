//! Invocation of the external `git` binary.
//!
//! Every spawn goes through [`git_command`], which scrubs the environment
//! so no credential helper or terminal prompt can block an unattended
//! resolve. No shell is involved; arguments are passed as a vector.

use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Output, Stdio};
use std::thread::JoinHandle;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::core::git::errors::{git_user_error, GitIssue};

fn git_command(args: &[&str], cwd: Option<&Path>) -> Command {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd.env("GIT_ASKPASS", "")
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GIT_SSH_COMMAND", "ssh -oBatchMode=yes");
    cmd
}

/// Buffered invocation: run to completion and return the raw output.
pub(crate) fn run_git(args: &[&str], cwd: Option<&Path>) -> Result<Output> {
    debug!(?args, cwd = cwd.map(|p| p.display().to_string()), "running git");
    git_command(args, cwd).output().map_err(|err| {
        git_user_error(GitIssue::GitUnavailable {
            error: err.to_string(),
        })
    })
}

/// Buffered invocation that must exit 0; returns stdout text, or a
/// process-failure issue carrying the trimmed stderr.
pub(crate) fn run_git_checked(
    action: &'static str,
    repository: &str,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<String> {
    let output = run_git(args, cwd)?;
    if !output.status.success() {
        return Err(git_user_error(GitIssue::ProcessFailed {
            action,
            repository: repository.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Exit state of a streamed invocation, with the drained stderr.
pub(crate) struct StreamStatus {
    pub(crate) success: bool,
    pub(crate) stderr: String,
}

/// A spawned git process whose stdout is consumed incrementally by the
/// caller (tar readers, hashing writers). Stderr drains on a side thread
/// so neither pipe can fill up and deadlock the child.
pub(crate) struct GitStream {
    child: Child,
    stdout: Option<ChildStdout>,
    stderr_thread: JoinHandle<String>,
}

impl GitStream {
    pub(crate) fn spawn(args: &[&str], cwd: Option<&Path>) -> Result<Self> {
        debug!(?args, "streaming git");
        let mut cmd = git_command(args, cwd);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd.spawn().map_err(|err| {
            git_user_error(GitIssue::GitUnavailable {
                error: err.to_string(),
            })
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("git child has no stdout pipe"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("git child has no stderr pipe"))?;
        let stderr_thread = std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        });
        Ok(Self {
            child,
            stdout: Some(stdout),
            stderr_thread,
        })
    }

    /// The child's stdout; present until [`GitStream::finish`].
    pub(crate) fn stdout(&mut self) -> Result<&mut ChildStdout> {
        self.stdout
            .as_mut()
            .ok_or_else(|| anyhow!("git stdout already consumed"))
    }

    /// Close stdout, await the exit status, and join the stderr drain.
    pub(crate) fn finish(mut self) -> Result<StreamStatus> {
        drop(self.stdout.take());
        let status = self.child.wait().context("failed to await git child")?;
        let stderr = self.stderr_thread.join().unwrap_or_default();
        Ok(StreamStatus {
            success: status.success(),
            stderr: stderr.trim().to_string(),
        })
    }
}
