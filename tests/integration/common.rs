//! Fake `snowsql` project shared by the CLI tests.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const FAKE_SNOWSQL: &str = r#"#!/bin/sh
echo "$*" >> "$FAKE_LOG"
case "$*" in
  *--version*) echo "Version: 1.2.32"; exit 0 ;;
  -l) echo "demo_admin | xy12345.us-east-1 | DEMO_USER"; exit 0 ;;
esac
case "$*" in
  *CURRENT_USER*)
    if [ -n "$FAKE_PROBE_FAIL" ]; then
      echo "250001: Could not connect to Snowflake backend" >&2
      exit 1
    fi
    echo "DEMO_USER"
    exit 0 ;;
esac
if [ -n "$FAKE_FAIL_SCRIPT" ]; then
  case "$*" in
    *"$FAKE_FAIL_SCRIPT"*)
      echo "SQL compilation error in $FAKE_FAIL_SCRIPT" >&2
      exit 1 ;;
  esac
fi
case "$*" in
  *output_format=csv*) echo "${FAKE_COUNT:-12}" ;;
  *) echo "ok" ;;
esac
"#;

pub const SQL_ASSETS: [&str; 8] = [
    "00_cleanup_demo.sql",
    "01_setup_database.sql",
    "02_create_tables.sql",
    "03_sample_data.sql",
    "04_cortex_search.sql",
    "05_semantic_model.yaml",
    "06_cortex_agent.sql",
    "complete_setup.sql",
];

/// Project directory with SQL assets and an executable fake tool.
pub struct FakeProject {
    pub dir: TempDir,
    pub tool: PathBuf,
    pub log: PathBuf,
}

impl FakeProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let sql = dir.path().join("sql");
        fs::create_dir_all(&sql).expect("sql dir");
        for asset in SQL_ASSETS {
            fs::write(sql.join(asset), "-- fixture\n").expect("write asset");
        }
        let tool = dir.path().join("snowsql");
        fs::write(&tool, FAKE_SNOWSQL).expect("write fake tool");
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).expect("chmod");
        let log = dir.path().join("invocations.log");
        Self { dir, tool, log }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn remove_asset(&self, name: &str) {
        fs::remove_file(self.root().join("sql").join(name)).expect("remove asset");
    }

    /// Points a command at this project and its fake tool.
    pub fn configure(&self, cmd: &mut assert_cmd::Command) {
        cmd.env("C360_DEMO_TOOL", &self.tool)
            .env("C360_DEMO_ROOT", self.root())
            .env("C360_DEMO_CONFIG", self.root().join("absent.toml"))
            .env("FAKE_LOG", &self.log)
            .env_remove("C360_DEMO_CONNECTION")
            .env_remove("C360_DEMO_LOG")
            .env_remove("FAKE_PROBE_FAIL")
            .env_remove("FAKE_FAIL_SCRIPT")
            .env_remove("FAKE_COUNT");
    }

    /// Argument lines the fake tool was invoked with.
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn ran_script(&self, name: &str) -> bool {
        self.invocations()
            .iter()
            .any(|line| line.contains("-f") && line.contains(name))
    }
}
