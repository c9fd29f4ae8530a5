// Linkproof - Cross-Toolchain Smoke Kit
// Copyright (C) 2026 The Linkproof Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

fn write_temp_file(prefix: &str, contents: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push("linkproof-tests");
    let _ = std::fs::create_dir_all(&dir);

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = dir.join(format!("{}-{}.yaml", prefix, nonce));
    std::fs::write(&path, contents).expect("Failed to write temp file");
    path
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Linkproof cross-toolchain smoke runner"));
}

#[test]
fn test_cli_version_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("linkproof"));
}

#[test]
fn test_cli_invalid_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .arg("--unknown-flag-xyz")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("error: unexpected argument '--unknown-flag-xyz'"));
}

#[test]
fn test_cli_check_missing_manifest_exit_2() {
    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args(["check", "--manifest", "no_such_manifest.yaml"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_check_passes_with_run_fixtures() {
    let manifest = write_temp_file(
        "manifest-pass",
        r#"
schema_version: "1.0"
name: "shell-fixtures"
checks:
  - name: "transcript"
    run:
      program: "/bin/sh"
      args: ["-c", "printf 'Hello, world!\\na = 5, b = 12\\na + b = c = 17\\n'"]
      expect:
        stdout: "Hello, world!\na = 5, b = 12\na + b = c = 17\n"
        exit_code: 0
  - name: "status-seventeen"
    run:
      program: "/bin/sh"
      args: ["-c", "exit 17"]
      expect:
        exit_code: 17
"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args(["check", "--manifest", manifest.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_cli_check_assertion_fail_exit_1() {
    let manifest = write_temp_file(
        "manifest-fail",
        r#"
schema_version: "1.0"
name: "fail-fixture"
checks:
  - name: "missing-substring"
    run:
      program: "/bin/sh"
      args: ["-c", "echo hello"]
      expect:
        stdout_contains: ["this string will not be present"]
"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args(["check", "--manifest", manifest.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_check_wall_time_stop_passes_when_expected() {
    let manifest = write_temp_file(
        "manifest-walltime",
        r#"
schema_version: "1.0"
name: "watchdog-fixture"
checks:
  - name: "sleeper-is-killed"
    run:
      program: "/bin/sh"
      args: ["-c", "sleep 30"]
      expect:
        stop_reason: wall_time
      limits:
        wall_time_ms: 100
"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args(["check", "--manifest", manifest.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    // Passes only because the watchdog fired and that was the expected stop.
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_cli_check_wall_time_stop_fails_when_not_expected() {
    let manifest = write_temp_file(
        "manifest-walltime-fail",
        r#"
schema_version: "1.0"
name: "watchdog-unexpected"
checks:
  - name: "sleeper-should-exit"
    run:
      program: "/bin/sh"
      args: ["-c", "sleep 30"]
      limits:
        wall_time_ms: 100
"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args(["check", "--manifest", manifest.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_check_watchdog_stops_forked_sleeper_promptly() {
    // The trailing `exit 0` forces the shell to fork for the sleep instead of
    // exec'ing it. The watchdog must stop that whole process tree at the
    // deadline; a surviving grandchild would hold the stdout pipe open and
    // pin the runner for the sleep's full eight seconds.
    let manifest = write_temp_file(
        "manifest-walltime-forked",
        r#"
schema_version: "1.0"
name: "watchdog-forked"
checks:
  - name: "forked-sleeper"
    run:
      program: "/bin/sh"
      args: ["-c", "sleep 8; exit 0"]
      expect:
        stop_reason: wall_time
      limits:
        wall_time_ms: 300
"#,
    );

    let started = Instant::now();
    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args(["check", "--manifest", manifest.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");
    let elapsed = started.elapsed();

    assert_eq!(output.status.code(), Some(0));
    assert!(
        elapsed < Duration::from_secs(4),
        "Runner took {:?} against a 300 ms wall-time limit",
        elapsed
    );
}

#[test]
fn test_cli_check_returns_despite_background_child() {
    // The check itself exits immediately and passes; the backgrounded sleeper
    // inherits the stdout pipe and outlives it. Output collection must not
    // wait for pipe EOF once the child has been reaped.
    let manifest = write_temp_file(
        "manifest-background-child",
        r#"
schema_version: "1.0"
name: "background-child"
checks:
  - name: "leaves-sleeper-behind"
    run:
      program: "/bin/sh"
      args: ["-c", "echo ready; sleep 8 & exit 0"]
      expect:
        stdout_contains: ["ready"]
        exit_code: 0
      limits:
        wall_time_ms: 5000
"#,
    );

    let started = Instant::now();
    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args(["check", "--manifest", manifest.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");
    let elapsed = started.elapsed();

    assert_eq!(output.status.code(), Some(0));
    assert!(
        elapsed < Duration::from_secs(4),
        "Runner took {:?} for a check that exited immediately",
        elapsed
    );
}

#[test]
fn test_cli_check_launch_error_exit_3() {
    let manifest = write_temp_file(
        "manifest-launch-error",
        r#"
schema_version: "1.0"
name: "launch-error-fixture"
checks:
  - name: "no-such-binary"
    run:
      program: "/nonexistent/linkproof-fixture-binary"
"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args(["check", "--manifest", manifest.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_cli_check_fail_takes_precedence_over_error() {
    // One check cannot even launch, another launches and misses its expected
    // exit code. The assertion failure decides the process exit code: 1, not
    // the launch error's 3.
    let manifest = write_temp_file(
        "manifest-fail-and-error",
        r#"
schema_version: "1.0"
name: "fail-and-error"
checks:
  - name: "no-such-binary"
    run:
      program: "/nonexistent/linkproof-fixture-binary"
  - name: "wrong-exit-code"
    run:
      program: "/bin/sh"
      args: ["-c", "exit 7"]
      expect:
        exit_code: 0
"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args(["check", "--manifest", manifest.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_check_only_filter() {
    let manifest = write_temp_file(
        "manifest-only",
        r#"
schema_version: "1.0"
name: "filter-fixture"
checks:
  - name: "alpha-pass"
    run:
      program: "/bin/sh"
      args: ["-c", "true"]
  - name: "beta-fail"
    run:
      program: "/bin/sh"
      args: ["-c", "echo hello"]
      expect:
        stdout_contains: ["absent"]
"#,
    );

    let filtered = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args([
            "check",
            "--manifest",
            manifest.to_str().unwrap(),
            "--only",
            "alpha",
        ])
        .output()
        .expect("Failed to execute command");
    assert_eq!(filtered.status.code(), Some(0));

    let unfiltered = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args(["check", "--manifest", manifest.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");
    assert_eq!(unfiltered.status.code(), Some(1));
}

#[test]
fn test_cli_check_only_filter_without_match_exit_2() {
    let manifest = write_temp_file(
        "manifest-only-nomatch",
        r#"
schema_version: "1.0"
name: "filter-fixture"
checks:
  - name: "alpha-pass"
    run:
      program: "/bin/sh"
      args: ["-c", "true"]
"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args([
            "check",
            "--manifest",
            manifest.to_str().unwrap(),
            "--only",
            "zzz-no-such-check",
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_check_wall_time_override_flag() {
    // The manifest grants the sleeper a generous budget; the flag shrinks it.
    let manifest = write_temp_file(
        "manifest-walltime-override",
        r#"
schema_version: "1.0"
name: "override-fixture"
checks:
  - name: "sleeper"
    run:
      program: "/bin/sh"
      args: ["-c", "sleep 30"]
      expect:
        stop_reason: wall_time
      limits:
        wall_time_ms: 60000
"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_linkproof"))
        .args([
            "check",
            "--manifest",
            manifest.to_str().unwrap(),
            "--wall-time-ms",
            "100",
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(0));
}
