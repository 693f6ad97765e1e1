//! Remote command execution.
//!
//! Everything that reaches the guest goes through a [`CommandRunner`], which takes a full
//! shell command line. [`ShellRunner`] hands it to `sh -c`; tests substitute a recording
//! runner so the orchestration can be checked without a VM.

use core::net::IpAddr;
use std::{
    io,
    path::Path,
    process::{self, ExitStatus},
};

use shlex::QuoteError;
use thiserror::Error as ThisError;
use tracing::debug;

/// Errors from running a shell command.
#[derive(Debug, ThisError)]
pub enum ExecError {
    #[error("failed to spawn shell for `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("command execution failed: {status}, output: {output}")]
    Failed {
        command: String,
        status: ExitStatus,
        output: String,
    },
}

/// Capability to run shell command lines.
pub trait CommandRunner {
    /// Runs `command`, printing the command line and its combined stdout/stderr.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] if the shell cannot be spawned or exits nonzero.
    fn run(&mut self, command: &str) -> Result<String, ExecError>;

    /// Runs `command` without echoing anything and returns its stdout.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] if the shell cannot be spawned or exits nonzero.
    fn capture(&mut self, command: &str) -> Result<String, ExecError>;
}

/// Runs commands through the local `sh`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &str) -> Result<String, ExecError> {
        println!("Executing command: {command}");

        // `exec 2>&1` merges stderr into stdout for the whole command line, keeping the order
        // in which the remote side wrote them.
        let output = process::Command::new("sh")
            .arg("-c")
            .arg(format!("exec 2>&1\n{command}"))
            .output()
            .map_err(|source| ExecError::Spawn {
                command: command.to_owned(),
                source,
            })?;
        let combined = String::from_utf8_lossy(&output.stdout).into_owned();

        println!("Command output:\n{combined}");

        if !output.status.success() {
            return Err(ExecError::Failed {
                command: command.to_owned(),
                status: output.status,
                output: combined,
            });
        }
        Ok(combined)
    }

    fn capture(&mut self, command: &str) -> Result<String, ExecError> {
        debug!(command, "Capturing command output");
        let output = process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|source| ExecError::Spawn {
                command: command.to_owned(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExecError::Failed {
                command: command.to_owned(),
                status: output.status,
                output: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// A guest reachable as `user@ip` over ssh/scp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHost<'cfg> {
    pub user: &'cfg str,
    pub ip: IpAddr,
    pub ssh: &'cfg str,
    pub scp: &'cfg str,
}

impl RemoteHost<'_> {
    /// Command line running `remote_command` on the guest.
    pub fn ssh_command(&self, remote_command: &str) -> String {
        format!("{} {}@{} {remote_command}", self.ssh, self.user, self.ip)
    }

    /// Command line copying `local` to `remote_path` on the guest.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError`] if `local` cannot be quoted for the shell.
    pub fn scp_command(&self, local: &Path, remote_path: &str) -> Result<String, QuoteError> {
        // the local path comes from $TMPDIR and may contain spaces or shell metacharacters
        let local = local.to_string_lossy();
        let local = shlex::try_quote(&local)?;
        // scp needs brackets to tell an IPv6 address from the `:path` suffix
        let host = match self.ip {
            IpAddr::V4(ip) => ip.to_string(),
            IpAddr::V6(ip) => format!("[{ip}]"),
        };
        Ok(format!("{} {local} {}@{host}:{remote_path}", self.scp, self.user))
    }
}
