//! CLI entrypoint for the `kvm_freebsd_hostname` binary.

use std::process::ExitCode;

use clap::Parser as _;
use kvm_freebsd_hostname::{cli::Cli, inner_main};

fn main() -> ExitCode {
    let invocation = match Cli::try_parse() {
        Ok(invocation) => invocation,
        Err(e) => {
            // --help and --version land here as well, and are not failures
            drop(e.print());
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match inner_main(invocation) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
