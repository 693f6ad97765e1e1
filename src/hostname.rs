//! Hostname change procedure.
//!
//! Resolves the VM through its lease, checks the guest reports the expected hostname, then
//! pushes the rename script with scp and runs it with sudo over ssh. The first failing step
//! aborts the run; nothing is rolled back.

use std::io;

use eyre::WrapErr as _;
use thiserror::Error as ThisError;
use tracing::info;

use crate::{
    config::Config,
    leases,
    remote::{CommandRunner, RemoteHost},
    script_generator::{ChangeScriptValues, generate_change_script, write_script},
    validation::validate_hostname,
};

/// Everything one invocation needs to know about the rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    /// Name the VM registered its DHCP lease under.
    pub vm_name: String,
    /// Remote user for ssh and scp.
    pub user: String,
    pub bridge: String,
    /// Hostname the guest must currently report.
    pub current_hostname: String,
    pub new_hostname: String,
}

/// Failures of the change procedure that are not lease lookups or command executions.
#[derive(Debug, ThisError)]
pub enum ChangeError {
    #[error("current hostname ({actual}) does not match expected hostname ({expected})")]
    HostnameMismatch { actual: String, expected: String },
    #[error("invalid new hostname {name:?}: {reason}")]
    InvalidHostname { name: String, reason: String },
    #[error("failed to prepare temporary script file")]
    TempFile(#[source] io::Error),
}

/// Renames the guest behind `request.vm_name` from `current_hostname` to `new_hostname`.
///
/// Issues exactly three commands through `runner`: the hostname check, the copy, and the
/// remote execution. The local script file is removed before returning, on every path.
///
/// # Errors
///
/// Returns an error if the new hostname is invalid, the VM has no lease, the guest reports a
/// different hostname than expected, or any of the commands fails.
#[tracing::instrument(
    skip_all,
    fields(vm = %request.vm_name, bridge = %request.bridge)
)]
pub fn change_hostname<R: CommandRunner>(
    request: ChangeRequest,
    config: &Config,
    runner: &mut R,
) -> eyre::Result<()> {
    validate_hostname(&request.new_hostname).map_err(|reason| ChangeError::InvalidHostname {
        name: request.new_hostname.clone(),
        reason,
    })?;

    let ip = leases::resolve_ip(&config.lease_dir, &request.bridge, &request.vm_name)
        .wrap_err("failed to resolve VM address")?;
    info!(%ip, "Resolved VM address");

    let remote = RemoteHost {
        user: &request.user,
        ip,
        ssh: &config.ssh,
        scp: &config.scp,
    };

    let reported = runner
        .capture(&remote.ssh_command("hostname"))
        .wrap_err("failed to get current hostname")?;
    let actual = reported.trim();
    if actual != request.current_hostname {
        return Err(ChangeError::HostnameMismatch {
            actual: actual.to_owned(),
            expected: request.current_hostname,
        }
        .into());
    }

    let script = generate_change_script(&ChangeScriptValues {
        new_hostname: &request.new_hostname,
        rc_conf: &config.rc_conf,
    });

    // Deleted when dropped, including on the early returns below.
    let script_file = tempfile::Builder::new()
        .prefix("change_hostname_")
        .suffix(".sh")
        .tempfile()
        .map_err(ChangeError::TempFile)?;
    write_script(script_file.path(), &script).map_err(ChangeError::TempFile)?;

    let remote_path = &config.remote_script_path;
    let copy = remote
        .scp_command(script_file.path(), remote_path)
        .wrap_err("failed to quote local script path")?;
    runner.run(&copy).wrap_err("failed to copy script to remote host")?;

    runner
        .run(&remote.ssh_command(&format!(
            "'chmod +x {remote_path} && sudo {remote_path} && rm {remote_path}'"
        )))
        .wrap_err("failed to execute script on remote host")?;

    info!(
        from = %request.current_hostname,
        to = %request.new_hostname,
        "Hostname changed"
    );
    Ok(())
}
