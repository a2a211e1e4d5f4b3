//! Subprocess invocation for granted commands.
//!
//! The workflow talks to an [`Executor`] rather than spawning processes
//! itself, so tests (and alternative transports) can substitute their own
//! implementation. The stock [`ShellExecutor`] runs commands through the
//! first POSIX shell found on PATH.

use crate::error::{QuorumError, Result};
use crate::types::ExecutionOutput;
use std::process::{Command, Stdio};

/// Runs a granted command and captures its combined output.
///
/// A non-zero exit must be reported as `exit_ok = false`, not as an error:
/// only a failure to launch the process at all is an `ExecFailed`.
pub trait Executor {
    fn run(&self, command: &str) -> Result<ExecutionOutput>;
}

/// The shells probed for, in priority order.
const SHELLS: &[&str] = &["sh", "bash"];

/// Executor that hands the command line to a POSIX shell.
pub struct ShellExecutor;

impl ShellExecutor {
    fn shell() -> Result<std::path::PathBuf> {
        for shell in SHELLS {
            if let Ok(path) = which::which(shell) {
                return Ok(path);
            }
        }
        Err(QuorumError::ExecFailed(
            "no POSIX shell found on PATH".to_string(),
        ))
    }
}

impl Executor for ShellExecutor {
    fn run(&self, command: &str) -> Result<ExecutionOutput> {
        let shell = Self::shell()?;
        let output = Command::new(shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| QuorumError::ExecFailed(e.to_string()))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ExecutionOutput {
            exit_ok: output.status.success(),
            text,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
