/// Smoke tests to verify the binary runs without panicking
use std::process::Command;

#[test]
fn binary_shows_help() {
    let output = Command::new("cargo")
        .args(["run", "--", "--help"])
        .output()
        .expect("Failed to execute cargo run");

    assert!(
        output.status.success(),
        "Binary failed to run --help: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("termglobe"),
        "Help output should mention termglobe"
    );
}

#[test]
fn binary_shows_version() {
    let output = Command::new("cargo")
        .args(["run", "--", "--version"])
        .output()
        .expect("Failed to execute cargo run");

    assert!(
        output.status.success(),
        "Binary failed to run --version: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("0.1.0"));
}

#[test]
fn invalid_subcommand_fails_gracefully() {
    let output = Command::new("cargo")
        .args(["run", "--", "nonexistent-command"])
        .output()
        .expect("Failed to execute cargo run");

    // Should fail with error, not panic
    assert!(
        !output.status.success(),
        "Invalid subcommand should return error status"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains("panicked at"),
        "Invalid subcommand should not cause panic"
    );
}

#[test]
fn points_lists_the_demo_data() {
    let output = Command::new("cargo")
        .args(["run", "--", "points"])
        .output()
        .expect("Failed to execute cargo run");

    assert!(
        output.status.success(),
        "points failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("unique points from 40 arcs"));
    assert!(stdout.lines().skip(2).any(|l| l.trim_start().starts_with('*')));
}

#[test]
fn missing_arc_file_exits_nonzero() {
    let output = Command::new("cargo")
        .args(["run", "--", "points", "--arcs", "/nonexistent/termglobe-arcs.json"])
        .output()
        .expect("Failed to execute cargo run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("termglobe:"));
    assert!(!stderr.contains("panicked at"));
}

#[test]
fn infinite_time_step_is_rejected() {
    let output = Command::new("cargo")
        .args(["run", "--", "globe", "--print", "--time", "inf"])
        .output()
        .expect("Failed to execute cargo run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--time"));
    assert!(!stderr.contains("panicked at"));
}
