use std::process::Command;

use predicates::str::contains;

#[test]
fn prints_version() {
    let exe = env!("CARGO_BIN_EXE_medium-responses");
    let output = Command::new(exe)
        .arg("--version")
        .output()
        .expect("run medium-responses --version");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "stdout was: {}",
        stdout.trim()
    );
}

#[test]
fn prints_help() {
    let exe = env!("CARGO_BIN_EXE_medium-responses");
    let output = Command::new(exe)
        .arg("--help")
        .output()
        .expect("run medium-responses --help");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(stdout.contains("medium-responses"));
    assert!(stdout.contains("--version"));
    assert!(stdout.contains("--output"));
}

#[test]
fn rejects_missing_url() {
    assert_cmd::Command::cargo_bin("medium-responses")
        .expect("binary built")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("usage"));
}

#[test]
fn rejects_unknown_flag() {
    assert_cmd::Command::cargo_bin("medium-responses")
        .expect("binary built")
        .arg("--bogus")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("unknown flag"));
}
