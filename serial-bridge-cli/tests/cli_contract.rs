//! Integration tests for core CLI contract behavior.

use {predicates::prelude::*, std::fs, tempfile::tempdir};

fn cli_cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("serial-bridge")
}

/// A device path that cannot exist on any platform.
fn missing_port() -> String {
    if cfg!(windows) {
        "COM_NOT_EXISTS_XYZ".to_string()
    } else {
        "/dev/serial-bridge-not-exists-xyz".to_string()
    }
}

#[test]
fn help_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serial-bridge"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn short_help_lists_legacy_forms() {
    let mut cmd = cli_cmd();
    cmd.arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("-tf PORT FILE"))
        .stdout(predicate::str::contains("-rw PORT"));
}

#[test]
fn no_arguments_prints_help_and_exits_zero() {
    let mut cmd = cli_cmd();
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_reports_platform() {
    let platform = if cfg!(windows) { "Windows" } else { "Unix" };

    let mut cmd = cli_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("serial-bridge"))
        .stdout(predicate::str::contains(platform))
        .stderr(predicate::str::is_empty());
}

#[test]
fn short_version_is_lowercase_v() {
    let mut cmd = cli_cmd();
    cmd.arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn list_with_unmatched_filter_prints_nothing() {
    let mut cmd = cli_cmd();
    cmd.args(["-s", "no-such-port-name-xyz"])
        .assert()
        .success()
        .code(0)
        .stdout(predicate::str::is_empty());
}

#[test]
fn list_subcommand_succeeds_without_filter() {
    let mut cmd = cli_cmd();
    cmd.arg("list")
        .assert()
        .success();
}

#[test]
fn send_to_missing_port_fails_with_open_error() {
    let mut cmd = cli_cmd();
    cmd.args(["-t", &missing_port(), "hello"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("serial-bridge-not-exists-xyz").or(
            predicate::str::contains("COM_NOT_EXISTS_XYZ"),
        ));
}

#[test]
fn send_file_to_missing_port_fails_before_reading_file() {
    let dir = tempdir().expect("tempdir should be created");
    let payload = dir
        .path()
        .join("payload.bin");
    fs::write(&payload, [0x41u8, 0x42, 0x0A]).expect("write payload");

    let mut cmd = cli_cmd();
    cmd.arg("-tf")
        .arg(missing_port())
        .arg(&payload)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to open"));
}

#[test]
fn receive_from_missing_port_fails() {
    let mut cmd = cli_cmd();
    cmd.args(["-r", &missing_port(), "4"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn terminal_on_missing_port_fails_without_banner() {
    let mut cmd = cli_cmd();
    cmd.args(["-rw", &missing_port()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Connection established").not());
}

// ============================================================================
// Exit Code Tests - usage errors exit 2
// ============================================================================

#[test]
fn exit_code_two_for_unknown_command() {
    let mut cmd = cli_cmd();
    cmd.arg("unknown-command-xyz")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn exit_code_two_for_invalid_flag() {
    let mut cmd = cli_cmd();
    cmd.arg("--invalid-flag-xyz")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn exit_code_two_for_missing_data_argument() {
    let mut cmd = cli_cmd();
    cmd.args(["-t", "/dev/ttyUSB0"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn exit_code_two_for_non_numeric_length() {
    let mut cmd = cli_cmd();
    cmd.args(["-r", "/dev/ttyUSB0", "lots"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn exit_code_two_for_terminal_without_port() {
    let mut cmd = cli_cmd();
    cmd.arg("-rw")
        .assert()
        .failure()
        .code(2);
}
