//! Library entry for the `kvm_freebsd_hostname` binary.
//!
//! Looks up a libvirt guest's address in the dnsmasq lease table of its bridge, verifies the
//! hostname it currently reports over ssh, then rewrites `/etc/rc.conf` and applies the new
//! hostname with a script pushed over scp.

pub mod cli;
pub mod config;
pub mod hostname;
pub mod leases;
pub mod remote;
pub mod script_generator;
pub mod validation;

use std::{
    io::{self, IsTerminal as _},
    sync::Once,
};

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use cli::{Cli, LogFormat};
use remote::ShellRunner;

static INIT_TRACING: Once = Once::new();

/// Installs the global tracing subscriber on stderr, keeping stdout for command output.
///
/// `RUST_LOG` overrides the default `warn` level.
pub fn init_tracing(format: LogFormat) {
    INIT_TRACING.call_once(move || {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_timer(ChronoLocal::rfc_3339())
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal());

        match format {
            LogFormat::Compact => builder.compact().init(),
            LogFormat::Json => builder.json().init(),
            LogFormat::Pretty => builder.pretty().init(),
        }
    });
}

/// Runs one hostname change as described by `invocation`; can be called from a shim binary.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded, no remote user is known, or any step of
/// the change fails.
pub fn inner_main(mut invocation: Cli) -> eyre::Result<()> {
    init_tracing(invocation.log_format);

    let mut config = config::load_or_default(invocation.config.as_deref())?;
    if let Some(lease_dir) = invocation.lease_dir.take() {
        config.lease_dir = lease_dir;
    }

    let request = invocation.into_request(&config)?;
    info!(vm = %request.vm_name, user = %request.user, "Changing hostname");

    hostname::change_hostname(request, &config, &mut ShellRunner)
}
