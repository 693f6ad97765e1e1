//! Renders the shell script that renames a FreeBSD guest.

use std::{fs, io, path::Path};

/// Configuration file holding the persistent `hostname="..."` line on FreeBSD.
pub const DEFAULT_RC_CONF: &str = "/etc/rc.conf";

/// Where the script is placed on the guest before it runs.
pub const DEFAULT_REMOTE_SCRIPT_PATH: &str = "/tmp/change_hostname.sh";

const TEMPLATE: &str = include_str!("../scripts/change_hostname.tmpl.sh");

#[derive(Debug)]
pub struct ChangeScriptValues<'val> {
    pub new_hostname: &'val str,
    pub rc_conf: &'val str,
}

/// Fills the hostname change template.
///
/// The script exits nonzero if `rc_conf` is missing or the live hostname does not read back
/// as `new_hostname` after the change.
pub fn generate_change_script(values: &ChangeScriptValues<'_>) -> String {
    TEMPLATE
        .replace("{rc_conf}", values.rc_conf)
        .replace("{new_hostname}", values.new_hostname)
}

/// Writes `script` to an already created file and marks it executable.
pub(crate) fn write_script(path: &Path, script: &str) -> Result<(), io::Error> {
    fs::write(path, script)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}
