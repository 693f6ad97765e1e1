//! Optional TOML configuration.
//!
//! Every key has a built-in default, so running without a config file behaves exactly like
//! an empty one. Command-line flags take precedence over values read here.

use std::{
    fs,
    path::{Path, PathBuf},
};

use eyre::WrapErr as _;
use serde::Deserialize;

use crate::{
    leases::{DEFAULT_BRIDGE, DEFAULT_LEASE_DIR},
    script_generator::{DEFAULT_RC_CONF, DEFAULT_REMOTE_SCRIPT_PATH},
};

/// Settings that rarely change between invocations.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Remote user, used when `--user` is not given and `$USER` is unset.
    pub user: Option<String>,
    /// Bridge whose lease table is searched when `--bridge` is not given.
    pub bridge: String,
    /// Directory holding the dnsmasq `<bridge>.status` files.
    pub lease_dir: PathBuf,
    /// Program used for remote execution.
    pub ssh: String,
    /// Program used to copy the script to the guest.
    pub scp: String,
    pub remote_script_path: String,
    pub rc_conf: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: None,
            bridge: DEFAULT_BRIDGE.to_owned(),
            lease_dir: PathBuf::from(DEFAULT_LEASE_DIR),
            ssh: "ssh".to_owned(),
            scp: "scp".to_owned(),
            remote_script_path: DEFAULT_REMOTE_SCRIPT_PATH.to_owned(),
            rc_conf: DEFAULT_RC_CONF.to_owned(),
        }
    }
}

/// Reads and parses the config from a TOML file.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
pub fn load<P: AsRef<Path>>(path: P) -> eyre::Result<Config> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(path_ref).wrap_err(format!(
        "Failed to read config file at: {}",
        path_ref.display()
    ))?;
    let config: Config = toml::from_str(&content).wrap_err(format!(
        "Failed to parse config as TOML at: {}",
        path_ref.display()
    ))?;
    Ok(config)
}

/// Loads `path` if given, otherwise returns the defaults.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_or_default(path: Option<&Path>) -> eyre::Result<Config> {
    path.map_or_else(|| Ok(Config::default()), load)
}
