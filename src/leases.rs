//! Lease store reader and VM resolver.
//!
//! libvirt keeps the dnsmasq lease table for every virtual bridge as a JSON array in
//! `<lease_dir>/<bridge>.status`. This module decodes that file and resolves a VM's
//! hostname to the IP address it was leased.

use core::net::IpAddr;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error as ThisError;
use tracing::debug;

/// Directory libvirt's dnsmasq writes the per-bridge status files to.
pub const DEFAULT_LEASE_DIR: &str = "/var/lib/libvirt/dnsmasq";

/// Bridge used when neither the CLI nor the config names one.
pub const DEFAULT_BRIDGE: &str = "virbr0";

/// A single DHCP lease as written by dnsmasq.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct LeaseRecord {
    pub ip_address: IpAddr,
    pub mac_address: String,
    /// Guests that never sent a hostname have no entry here.
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    /// Seconds since the unix epoch.
    pub expiry_time: i64,
}

/// Errors raised while reading or querying a lease store.
#[derive(Debug, ThisError)]
pub enum LeaseError {
    #[error("failed to read status file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse status file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("VM not found: {name} (bridge {bridge})")]
    NotFound { name: String, bridge: String },
}

/// All leases handed out on one bridge, in file order.
#[derive(Debug, Clone)]
pub struct LeaseStore {
    bridge: String,
    records: Vec<LeaseRecord>,
}

/// Path of the status file for `bridge` inside `lease_dir`.
pub fn status_file_path(lease_dir: &Path, bridge: &str) -> PathBuf {
    lease_dir.join(format!("{bridge}.status"))
}

impl LeaseStore {
    /// Reads and decodes the status file of `bridge`.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::Read`] if the file cannot be read and [`LeaseError::Parse`]
    /// if it is not a JSON array of lease records.
    pub fn load(lease_dir: &Path, bridge: &str) -> Result<Self, LeaseError> {
        let path = status_file_path(lease_dir, bridge);
        let content = fs::read_to_string(&path).map_err(|source| LeaseError::Read {
            path: path.clone(),
            source,
        })?;
        let records = parse_records(&content).map_err(|source| LeaseError::Parse {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), leases = records.len(), "Loaded lease store");
        Ok(Self {
            bridge: bridge.to_owned(),
            records,
        })
    }

    /// First lease whose hostname equals `hostname`.
    pub fn find(&self, hostname: &str) -> Option<&LeaseRecord> {
        self.records
            .iter()
            .find(|record| record.hostname.as_deref() == Some(hostname))
    }

    /// IP address leased to `hostname`.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::NotFound`] if no lease carries that hostname.
    pub fn ip_of(&self, hostname: &str) -> Result<IpAddr, LeaseError> {
        self.find(hostname)
            .map(|record| record.ip_address)
            .ok_or_else(|| LeaseError::NotFound {
                name: hostname.to_owned(),
                bridge: self.bridge.clone(),
            })
    }
}

/// dnsmasq leaves the file empty (not `[]`) once the last lease expired.
fn parse_records(content: &str) -> Result<Vec<LeaseRecord>, serde_json::Error> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(content)
}

/// Resolves the IP address of `vm_name` from the lease table of `bridge`.
///
/// # Errors
///
/// Propagates read and parse failures of the status file, and
/// [`LeaseError::NotFound`] if the VM holds no lease on that bridge.
pub fn resolve_ip(lease_dir: &Path, bridge: &str, vm_name: &str) -> Result<IpAddr, LeaseError> {
    LeaseStore::load(lease_dir, bridge)?.ip_of(vm_name)
}
