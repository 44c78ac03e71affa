#![allow(missing_docs)]
#![cfg(unix)]

mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::FakeProject;
use serde_json::Value;

fn manager(project: &FakeProject) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("demo-manager");
    project.configure(&mut cmd);
    cmd
}

#[test]
fn status_emits_json() {
    let project = FakeProject::new();
    let output = manager(&project)
        .args(["--format", "json", "-c", "demo_admin", "status"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["verdict"], "ready");
    assert!(json["success"].as_bool().unwrap_or(false));
    assert_eq!(json["connection"], "'demo_admin'");
    assert_eq!(json["schema"], "CUSTOMER_360_DB.PUBLIC");
    let checks = json["checks"].as_array().expect("checks");
    assert_eq!(checks.len(), 9);
    assert_eq!(checks[0]["name"], "CUSTOMERS");
    assert_eq!(checks[0]["kind"], "table");
    assert_eq!(checks[0]["count"], 12);
    assert_eq!(checks[0]["state"], "good");
}

#[test]
fn thin_data_is_partial_and_succeeds() {
    let project = FakeProject::new();
    let output = manager(&project)
        .args(["--format", "json", "status"])
        .env("FAKE_COUNT", "3")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["verdict"], "partial");
    assert_eq!(json["connection"], "<default>");
}

#[test]
fn empty_demo_exits_two() {
    let project = FakeProject::new();
    let output = manager(&project)
        .args(["--theme", "plain", "status"])
        .env("FAKE_COUNT", "0")
        .assert()
        .code(2)
        .get_output()
        .clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DEMO STATUS"));
    assert!(stdout.contains("CUSTOMERS"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Demo is not ready"));
}

#[test]
fn status_probes_connection_first() {
    let project = FakeProject::new();
    manager(&project)
        .args(["-c", "demo_admin", "status"])
        .env("FAKE_PROBE_FAIL", "1")
        .assert()
        .code(1);
    let calls = project.invocations();
    assert_eq!(calls.len(), 2, "calls: {calls:?}");
    assert!(calls.iter().all(|line| !line.contains("COUNT(*)")));
}

#[test]
fn next_steps_needs_no_tool() {
    let project = FakeProject::new();
    let output = manager(&project)
        .args(["--theme", "plain", "next-steps"])
        .env("C360_DEMO_TOOL", project.root().join("no-such-snowsql"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("NEXT STEPS"));
    assert!(text.contains("Deploy the Streamlit application"));
    assert!(project.invocations().is_empty());
}

#[test]
fn setup_database_runs_scripts_in_order() {
    let project = FakeProject::new();
    manager(&project)
        .args(["--quiet", "setup-database"])
        .assert()
        .success();
    let scripts: Vec<String> = project
        .invocations()
        .into_iter()
        .filter(|line| line.contains("exit_on_error"))
        .collect();
    assert_eq!(scripts.len(), 3);
    assert!(scripts[0].contains("01_setup_database.sql"));
    assert!(scripts[1].contains("02_create_tables.sql"));
    assert!(scripts[2].contains("03_sample_data.sql"));
}

#[test]
fn cleanup_without_confirmation_is_cancelled() {
    let project = FakeProject::new();
    let output = manager(&project)
        .args(["--format", "json", "cleanup"])
        .write_stdin("n\n")
        .assert()
        .success()
        .get_output()
        .clone();
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["step"], "cleanup");
    assert_eq!(json["completed"], false);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Continue? (y/N)"));
    assert!(!project.ran_script("00_cleanup_demo.sql"));
}

#[test]
fn json_step_output_is_machine_readable() {
    let project = FakeProject::new();
    let output = manager(&project)
        .args(["--format", "json", "setup-search"])
        .assert()
        .success()
        .get_output()
        .clone();
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["step"], "setup-search");
    assert_eq!(json["completed"], true);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SETTING UP CORTEX SEARCH"));
    assert!(project.ran_script("04_cortex_search.sql"));
}

#[test]
fn unknown_flag_exits_one_with_usage() {
    let project = FakeProject::new();
    let output = manager(&project)
        .arg("--bogus")
        .assert()
        .code(1)
        .get_output()
        .clone();
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
    assert!(project.invocations().is_empty());
}

#[test]
fn version_flag_exits_zero() {
    let project = FakeProject::new();
    manager(&project).arg("--version").assert().success();
    assert!(project.invocations().is_empty());
}

#[test]
fn agent_setup_requires_semantic_model() {
    let project = FakeProject::new();
    project.remove_asset("05_semantic_model.yaml");
    let output = manager(&project)
        .args(["setup-agent", "--uploaded"])
        .assert()
        .code(1)
        .get_output()
        .clone();
    assert!(String::from_utf8_lossy(&output.stderr).contains("05_semantic_model.yaml"));
    assert!(!project.ran_script("06_cortex_agent.sql"));
}

#[test]
fn menu_exits_on_end_of_input() {
    let project = FakeProject::new();
    let output = manager(&project)
        .args(["--theme", "plain"])
        .write_stdin("demo_admin\n7\n\n8\n")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("Available connections:"));
    assert!(text.contains("demo_admin | xy12345.us-east-1"));
    assert!(text.contains("Connection successful!"));
    assert!(text.contains("CUSTOMER 360 DEMO MANAGER"));
    assert!(text.contains("NEXT STEPS"));
    assert!(text.contains("Goodbye!"));
}
