//! Shared helpers for `skibus` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::time::Duration;

/// Default timeout for a CLI run.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(30);

/// Build a Command for the `skibus` binary writing into a fresh temp directory.
///
/// Returns (command, guard); keep the guard alive for the test's duration.
pub fn skibus_cmd() -> (assert_cmd::Command, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("create temp dir for output");
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("skibus");
    cmd.timeout(TIMEOUT_BASIC);
    cmd.env_remove("SKIBUS_OUTPUT");
    cmd.env_remove("SKIBUS_SEED");
    cmd.current_dir(tmp.path());
    (cmd, tmp)
}
