#![allow(clippy::unwrap_used)]
// CLI surface tests: argument parsing and offline failure modes.
// Everything that needs a live appliance is covered in core's
// reconcile tests against wiremock.

use assert_cmd::Command;
use predicates::prelude::*;

fn bigsync() -> Command {
    let mut cmd = Command::cargo_bin("bigsync").unwrap();
    // Keep the host environment out of credential resolution.
    cmd.env_remove("BIGSYNC_APPLIANCE")
        .env_remove("BIGSYNC_USERNAME")
        .env_remove("BIGSYNC_PASSWORD")
        .env_remove("BIGSYNC_PROFILE");
    cmd
}

#[test]
fn help_lists_the_command_tree() {
    bigsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn no_arguments_shows_usage() {
    bigsync().assert().failure().code(2);
}

#[test]
fn show_rejects_unknown_kind() {
    bigsync()
        .args(["show", "route-domain", "foo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn completions_generate_for_bash() {
    bigsync()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bigsync"));
}

#[test]
fn rm_without_confirmation_is_refused() {
    // Fails before any connection is attempted: no -y and no --check.
    // (Connection setup would fail anyway without credentials; the
    // confirmation check runs only after config resolution, so provide
    // enough environment to get there.)
    bigsync()
        .args(["rm", "vlan", "vlan-a"])
        .env("BIGSYNC_APPLIANCE", "https://127.0.0.1:9")
        .env("BIGSYNC_USERNAME", "admin")
        .env("BIGSYNC_PASSWORD", "x")
        .assert()
        .failure();
}
