#![allow(missing_docs)]
#![cfg(unix)]

mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::FakeProject;

fn reset(project: &FakeProject) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("reset-demo");
    project.configure(&mut cmd);
    cmd
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_exits_zero_and_lists_config_flag() {
    let project = FakeProject::new();
    for flag in ["-h", "--help"] {
        let output = reset(&project).arg(flag).assert().success().get_output().clone();
        let text = stdout_of(&output);
        assert!(text.contains("--config"), "help text: {text}");
    }
    assert!(project.invocations().is_empty());
}

#[test]
fn unknown_flag_exits_one_with_usage() {
    let project = FakeProject::new();
    for flag in ["--bogus", "--version", "-x"] {
        let output = reset(&project).arg(flag).assert().code(1).get_output().clone();
        let text = stderr_of(&output);
        assert!(text.contains("Usage"), "stderr for {flag}: {text}");
    }
    assert!(project.invocations().is_empty());
}

#[test]
fn missing_tool_exits_one() {
    let project = FakeProject::new();
    let output = reset(&project)
        .env("C360_DEMO_TOOL", project.root().join("no-such-snowsql"))
        .write_stdin("y\n")
        .assert()
        .code(1)
        .get_output()
        .clone();
    assert!(stderr_of(&output).contains("error:"));
}

#[test]
fn failed_probe_never_reaches_cleanup() {
    let project = FakeProject::new();
    let output = reset(&project)
        .args(["-c", "demo_admin"])
        .env("FAKE_PROBE_FAIL", "1")
        .write_stdin("y\n")
        .assert()
        .code(1)
        .get_output()
        .clone();
    assert!(stderr_of(&output).contains("Could not connect"));
    let calls = project.invocations();
    assert_eq!(calls.len(), 2, "calls: {calls:?}");
    assert!(calls[1].contains("-c demo_admin"));
    assert!(calls[1].contains("CURRENT_USER"));
    assert!(!project.ran_script("00_cleanup_demo.sql"));
}

#[test]
fn declining_exits_zero_without_scripts() {
    let project = FakeProject::new();
    let output = reset(&project)
        .args(["--config", "demo_admin"])
        .write_stdin("n\n")
        .assert()
        .success()
        .get_output()
        .clone();
    assert!(stdout_of(&output).contains("Are you sure you want to reset the demo?"));
    assert!(project
        .invocations()
        .iter()
        .all(|line| !line.contains("exit_on_error")));
}

#[test]
fn cleanup_failure_stops_before_setup() {
    let project = FakeProject::new();
    let output = reset(&project)
        .env("FAKE_FAIL_SCRIPT", "00_cleanup_demo.sql")
        .write_stdin("y\n")
        .assert()
        .code(1)
        .get_output()
        .clone();
    let stderr = stderr_of(&output);
    assert!(stderr.contains("Demo cleanup failed with exit code 1"), "stderr: {stderr}");
    assert!(stderr.contains("SQL compilation error"));
    assert!(project.ran_script("00_cleanup_demo.sql"));
    assert!(!project.ran_script("complete_setup.sql"));
    assert!(!project.ran_script("03_sample_data.sql"));
}

#[test]
fn missing_script_fails_before_prompt() {
    let project = FakeProject::new();
    project.remove_asset("complete_setup.sql");
    let output = reset(&project)
        .write_stdin("y\n")
        .assert()
        .code(1)
        .get_output()
        .clone();
    assert!(stderr_of(&output).contains("complete_setup.sql"));
    assert!(!stdout_of(&output).contains("Are you sure"));
    assert!(!project.ran_script("00_cleanup_demo.sql"));
}
