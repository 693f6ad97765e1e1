//! End-to-end hostname changes against the fake remote.

use std::{fs, path::Path};

use crate::common::{Sandbox, stderr, stdout};

const CHANGE: &[&str] = &["--user", "admin", "--current", "old", "--new", "web01", "vm1"];

#[test]
fn successful_change_checks_copies_and_executes_in_order() {
    let sandbox = Sandbox::new("old");
    let output = sandbox.run(CHANGE);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(
        sandbox.remote_log(),
        vec![
            "ssh admin@10.0.0.5 hostname".to_owned(),
            "scp admin@10.0.0.5:/tmp/change_hostname.sh".to_owned(),
            "ssh admin@10.0.0.5 chmod +x /tmp/change_hostname.sh && sudo /tmp/change_hostname.sh && rm /tmp/change_hostname.sh".to_owned(),
        ]
    );

    let out = stdout(&output);
    assert_eq!(out.matches("Executing command: ").count(), 2, "{out}");
    assert!(out.contains("Command output:"), "{out}");
}

#[test]
fn copied_script_sets_new_hostname_and_local_copy_is_removed() {
    let sandbox = Sandbox::new("old");
    let output = sandbox.run(CHANGE);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    let script = fs::read_to_string(sandbox.copy_path()).expect("script was not copied");
    assert!(script.contains(r#"hostname="web01""#), "{script}");

    // the scp line echoed on stdout names the local temp file
    let out = stdout(&output);
    let local = out
        .lines()
        .find_map(|line| line.strip_prefix("Executing command: "))
        .and_then(|command| command.split_whitespace().rev().nth(1))
        .expect("scp command not echoed");
    assert!(!Path::new(local).exists(), "{local} was left behind");
}

#[test]
fn local_script_under_tmpdir_with_space_is_copied() {
    let sandbox = Sandbox::new("old");
    let tmpdir = sandbox.path().join("my tmp");
    fs::create_dir(&tmpdir).expect("failed to create tmpdir");

    let output = sandbox.run_with_env(&[("TMPDIR", tmpdir.as_path())], CHANGE);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let script = fs::read_to_string(sandbox.copy_path()).expect("script was not copied");
    assert!(script.contains(r#"hostname="web01""#), "{script}");
    assert_eq!(sandbox.remote_log().len(), 3, "{:?}", sandbox.remote_log());
    assert!(
        fs::read_dir(&tmpdir).expect("tmpdir is gone").next().is_none(),
        "local script was left behind in {}",
        tmpdir.display()
    );
}

#[test]
fn hostname_mismatch_aborts_before_copy() {
    let sandbox = Sandbox::new("someone-else");
    let output = sandbox.run(CHANGE);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains(
            "Error: current hostname (someone-else) does not match expected hostname (old)"
        ),
        "{}",
        stderr(&output)
    );
    assert_eq!(sandbox.remote_log(), vec!["ssh admin@10.0.0.5 hostname".to_owned()]);
    assert!(!sandbox.copy_path().exists(), "script was copied");
}

#[test]
fn failure_is_reported_once_without_colors() {
    let sandbox = Sandbox::new("someone-else");
    let output = sandbox.run(CHANGE);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert_eq!(err.matches("does not match expected hostname").count(), 1, "{err}");
    assert!(!err.contains('\x1b'), "escape codes on a non-terminal stderr: {err:?}");
}

#[test]
fn unknown_vm_fails_without_remote_calls() {
    let sandbox = Sandbox::new("old");
    let output = sandbox.run(&["--user", "admin", "--current", "old", "--new", "new", "ghost"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("Error: failed to resolve VM address: VM not found: ghost"),
        "{}",
        stderr(&output)
    );
    assert!(sandbox.remote_log().is_empty(), "remote was contacted");
}

#[test]
fn malformed_lease_table_is_a_parse_error() {
    let sandbox = Sandbox::new("old");
    fs::write(sandbox.path().join("virbr0.status"), "[{").expect("failed to write leases");
    let output = sandbox.run(CHANGE);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to parse status file"), "{}", stderr(&output));
    assert!(sandbox.remote_log().is_empty(), "remote was contacted");
}

#[test]
fn missing_bridge_lease_table_is_a_read_error() {
    let sandbox = Sandbox::new("old");
    let output = sandbox.run(&[
        "--user",
        "admin",
        "--bridge",
        "virbr7",
        "--current",
        "old",
        "--new",
        "new",
        "vm1",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to read status file"), "{}", stderr(&output));
    assert!(stderr(&output).contains("virbr7.status"), "{}", stderr(&output));
}

#[test]
fn lease_dir_flag_overrides_config() {
    let sandbox = Sandbox::new("old");
    let other = tempfile::tempdir().expect("failed to create temp dir");
    let output = sandbox.run(&[
        "--lease-dir",
        other.path().to_str().expect("utf-8 temp path"),
        "--user",
        "admin",
        "--current",
        "old",
        "--new",
        "new",
        "vm1",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains(&other.path().join("virbr0.status").display().to_string()),
        "{}",
        stderr(&output)
    );
}
