//! End-to-end tests for the GUI launcher.
//!
//! Each test runs the built binary in a fresh temporary directory so the
//! fixed relative paths resolve against a controlled filesystem.

use std::fs;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn run_launcher(dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_run-gui"))
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .expect("launcher should start")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn missing_environment_reports_and_exits_with_one() {
    let dir = TempDir::new().unwrap();
    let output = run_launcher(dir.path());

    assert_eq!(output.status.code(), Some(1));

    let stdout = stdout_of(&output);
    assert!(stdout.contains("environment not found"), "stdout: {stdout}");
    assert!(stdout.contains("pip install"), "stdout: {stdout}");
    assert!(!stdout.contains("Starting GUI scanner"));
}

#[test]
fn missing_environment_does_not_create_files() {
    let dir = TempDir::new().unwrap();
    run_launcher(dir.path());

    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert!(entries.is_empty(), "launcher must not write to the filesystem");
}

#[test]
fn repeated_runs_are_identical() {
    let dir = TempDir::new().unwrap();
    let first = run_launcher(dir.path());
    let second = run_launcher(dir.path());

    assert_eq!(first.status.code(), second.status.code());
    assert_eq!(stdout_of(&first), stdout_of(&second));
}

#[cfg(unix)]
mod with_environment {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Drop a fake interpreter at the expected virtual-environment path.
    fn install_fake_interpreter(dir: &Path, body: &str) {
        let bin_dir = dir.join("venv/bin");
        fs::create_dir_all(&bin_dir).unwrap();

        let python = bin_dir.join("python");
        fs::write(&python, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&python, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn propagates_child_exit_code() {
        let dir = TempDir::new().unwrap();
        install_fake_interpreter(dir.path(), "exit 42");

        let output = run_launcher(dir.path());
        assert_eq!(output.status.code(), Some(42));
        assert!(!stdout_of(&output).contains("environment not found"));
    }

    #[test]
    fn passes_script_path_as_sole_argument() {
        let dir = TempDir::new().unwrap();
        install_fake_interpreter(dir.path(), r#"echo "argc=$# arg1=$1""#);

        let output = run_launcher(dir.path());
        assert_eq!(output.status.code(), Some(0));

        let stdout = stdout_of(&output);
        assert!(stdout.contains("Starting GUI scanner"), "stdout: {stdout}");
        assert!(
            stdout.contains("argc=1 arg1=apps/gui_scanner.py"),
            "stdout: {stdout}"
        );
    }

    #[test]
    fn successful_run_exits_zero() {
        let dir = TempDir::new().unwrap();
        install_fake_interpreter(dir.path(), "exit 0");

        let output = run_launcher(dir.path());
        assert_eq!(output.status.code(), Some(0));
    }
}
