//! Hostname syntax checks.
//!
//! The new hostname ends up inside a `sed` expression and a shell command on the guest, so it
//! is restricted to RFC 1123 names before anything is sent.

use std::sync::LazyLock;

use regex::Regex;

const MAX_HOSTNAME_LEN: usize = 253;

#[expect(clippy::unwrap_used, reason = "The pattern is a constant and known to compile.")]
static LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").unwrap());

/// Checks that `name` is a valid RFC 1123 hostname.
///
/// # Errors
///
/// Returns a message describing the first violated rule.
pub fn validate_hostname(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("hostname is empty".to_owned());
    }
    if name.len() > MAX_HOSTNAME_LEN {
        return Err(format!(
            "hostname is {} characters long, at most {MAX_HOSTNAME_LEN} are allowed",
            name.len()
        ));
    }
    for label in name.split('.') {
        if !LABEL.is_match(label) {
            return Err(format!(
                "invalid label {label:?}: labels are 1-63 letters, digits or hyphens and must not start or end with a hyphen"
            ));
        }
    }
    Ok(())
}
