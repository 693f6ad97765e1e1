//! Command-line interface definitions.

use std::{env, path::PathBuf};

use clap::{Parser, ValueEnum, builder::NonEmptyStringValueParser};
use eyre::eyre;
use nix::unistd::{self, User};

use crate::{config::Config, hostname::ChangeRequest};

/// Top-level command-line interface definition.
#[derive(Debug, Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    /// SSH user on the guest. Falls back to the config file, then the invoking user.
    #[arg(long, short)]
    pub user: Option<String>,

    /// Bridge whose dnsmasq lease table is searched [default: virbr0]
    #[arg(long, short)]
    pub bridge: Option<String>,

    /// Hostname the guest currently reports.
    #[arg(long, short, value_parser = NonEmptyStringValueParser::new())]
    pub current: String,

    /// Hostname to set on the guest.
    #[arg(long, short, value_parser = NonEmptyStringValueParser::new())]
    pub new: String,

    /// Path to an optional TOML configuration file.
    #[arg(long, env = "KVM_HOSTNAME_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the `<bridge>.status` lease files (overrides the config).
    #[arg(long)]
    pub lease_dir: Option<PathBuf>,

    /// Format of the diagnostic log written to stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Name the VM registered its DHCP lease under.
    pub vm_name: String,
}

/// Output formats for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl Cli {
    /// Combines the parsed flags with `config` into the parameters of one rename.
    ///
    /// # Errors
    ///
    /// Returns an error if no remote user can be determined.
    pub fn into_request(self, config: &Config) -> eyre::Result<ChangeRequest> {
        let user = self
            .user
            .or_else(|| config.user.clone())
            .or_else(invoking_user)
            .ok_or_else(|| {
                eyre!("no remote user: pass --user, set `user` in the config file or set $USER")
            })?;

        Ok(ChangeRequest {
            vm_name: self.vm_name,
            user,
            bridge: self.bridge.unwrap_or_else(|| config.bridge.clone()),
            current_hostname: self.current,
            new_hostname: self.new,
        })
    }
}

/// `$USER`, or the account name of the current uid when it is unset.
fn invoking_user() -> Option<String> {
    user_or_account(env::var("USER").ok())
}

fn user_or_account(env_user: Option<String>) -> Option<String> {
    env_user.filter(|user| !user.is_empty()).or_else(|| {
        User::from_uid(unistd::getuid())
            .ok()
            .flatten()
            .map(|user| user.name)
    })
}
