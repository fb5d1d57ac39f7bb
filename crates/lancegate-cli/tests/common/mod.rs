//! Shared test utilities for lancegate-cli integration tests.

use std::path::Path;

use assert_cmd::Command;

/// Get a Command for the lancegate binary.
///
/// # Panics
///
/// Panics if the lancegate binary cannot be found. This should not happen
/// in a properly configured test environment.
#[allow(deprecated)]
pub fn lancegate_cmd() -> Command {
    Command::cargo_bin("lancegate").expect("lancegate binary should exist")
}

/// A lancegate command bound to a file-backed store under `root`.
///
/// Points `--config` at a file that does not exist so the user's own
/// configuration never leaks into tests.
pub fn store_cmd(root: &Path) -> Command {
    let mut cmd = lancegate_cmd();
    cmd.env_remove("LANCEGATE_LOCATION")
        .env_remove("LANCEGATE_BACKEND")
        .env_remove("LANCEGATE_VERBOSE")
        .env("NO_COLOR", "1")
        .arg("--config")
        .arg(root.join("no-config.yaml"))
        .arg("--location")
        .arg(root.join("vectors"))
        .arg("--backend")
        .arg("simple");
    cmd
}
