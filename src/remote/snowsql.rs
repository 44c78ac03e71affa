use std::ffi::OsString;
use std::time::Duration;

use tokio::process::Command;

use super::subprocess::{run_command, RunError, ToolOutput};
use super::{RemoteTool, Request};

/// Options that turn query output into bare CSV rows.
const CSV_OPTIONS: [&str; 4] = [
    "output_format=csv",
    "header=false",
    "timing=false",
    "friendly=false",
];

/// The vendor's `snowsql` command-line client.
#[derive(Clone, Debug)]
pub struct SnowSql {
    program: String,
}

impl SnowSql {
    /// Uses `program` (a name on `PATH` or an explicit path).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments for one request.
    pub fn arguments(connection: Option<&str>, request: &Request) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if let Request::ListConnections = request {
            args.push("-l".into());
            return args;
        }
        if let Some(name) = connection {
            args.push("-c".into());
            args.push(name.into());
        }
        match request {
            Request::Script(path) => {
                args.push("-f".into());
                args.push(path.as_os_str().to_os_string());
                args.push("-o".into());
                args.push("exit_on_error=true".into());
            }
            Request::Query(sql) => {
                args.push("-q".into());
                args.push(sql.into());
            }
            Request::CsvQuery(sql) => {
                args.push("-q".into());
                args.push(sql.into());
                for option in CSV_OPTIONS {
                    args.push("-o".into());
                    args.push(option.into());
                }
            }
            Request::ListConnections => {}
        }
        args
    }
}

impl RemoteTool for SnowSql {
    fn program(&self) -> &str {
        &self.program
    }

    async fn version(&self, timeout: Duration) -> Result<ToolOutput, RunError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--version");
        run_command(&mut cmd, timeout).await
    }

    async fn execute(
        &self,
        connection: Option<&str>,
        request: &Request,
        timeout: Duration,
    ) -> Result<ToolOutput, RunError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(Self::arguments(connection, request));
        run_command(&mut cmd, timeout).await
    }
}
