//! Settings for the provisioning binaries.
//!
//! Settings come from an optional TOML file (`$C360_DEMO_CONFIG`, falling back
//! to `<config dir>/c360-demo/config.toml`) and a handful of environment
//! overrides. A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "C360_DEMO_CONFIG";
/// Environment variable overriding the remote query tool.
pub const TOOL_ENV: &str = "C360_DEMO_TOOL";
/// Environment variable overriding the demo project root.
pub const ROOT_ENV: &str = "C360_DEMO_ROOT";
/// Environment variable overriding the default connection name.
pub const CONNECTION_ENV: &str = "C360_DEMO_CONNECTION";

const DEFAULT_TOOL: &str = "snowsql";
const DEFAULT_DATABASE: &str = "CUSTOMER_360_DB";
const DEFAULT_SCHEMA: &str = "PUBLIC";
const DEFAULT_PROBE_SECS: u64 = 30;
const DEFAULT_SCRIPT_SECS: u64 = 300;
const DEFAULT_QUERY_SECS: u64 = 60;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 900;

/// Cleanup script dropping every demo object.
pub const CLEANUP_SCRIPT: &str = "sql/00_cleanup_demo.sql";
/// Database and warehouse creation.
pub const DATABASE_SCRIPT: &str = "sql/01_setup_database.sql";
/// Table creation.
pub const TABLES_SCRIPT: &str = "sql/02_create_tables.sql";
/// Sample data load.
pub const SAMPLE_DATA_SCRIPT: &str = "sql/03_sample_data.sql";
/// Search service creation.
pub const SEARCH_SCRIPT: &str = "sql/04_cortex_search.sql";
/// Semantic model uploaded by hand before the agent script runs.
pub const SEMANTIC_MODEL: &str = "sql/05_semantic_model.yaml";
/// Agent and AI function creation.
pub const AGENT_SCRIPT: &str = "sql/06_cortex_agent.sql";
/// Single-file setup used by the reset sequencer.
pub const COMPLETE_SETUP_SCRIPT: &str = "sql/complete_setup.sql";

/// Timeouts applied to individual remote invocations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// Reachability probe.
    pub probe: Duration,
    /// Whole SQL script.
    pub script: Duration,
    /// Single query (status checks, verification, readiness poll).
    pub query: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(DEFAULT_PROBE_SECS),
            script: Duration::from_secs(DEFAULT_SCRIPT_SECS),
            query: Duration::from_secs(DEFAULT_QUERY_SECS),
        }
    }
}

/// Scripts the reset sequencer runs, relative to the project root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResetScripts {
    /// Drops every demo object.
    pub cleanup: PathBuf,
    /// Recreates every demo object.
    pub setup: PathBuf,
    /// Loads the fixed sample data.
    pub load: PathBuf,
}

impl Default for ResetScripts {
    fn default() -> Self {
        Self {
            cleanup: PathBuf::from(CLEANUP_SCRIPT),
            setup: PathBuf::from(COMPLETE_SETUP_SCRIPT),
            load: PathBuf::from(SAMPLE_DATA_SCRIPT),
        }
    }
}

/// Operator-supplied completion check run after the data load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadinessSettings {
    /// Query run repeatedly; its CSV output is searched for `ready_marker`.
    pub query: String,
    /// Case-insensitive text whose presence means "ready".
    pub ready_marker: String,
    /// Delay between polls.
    pub interval: Duration,
    /// Total time allowed before giving up.
    pub timeout: Duration,
}

/// Fully resolved settings.
#[derive(Clone, Debug)]
pub struct Settings {
    path: Option<PathBuf>,
    /// Connection used when none is given on the command line.
    pub default_connection: Option<String>,
    /// Remote query tool program (name on `PATH` or explicit path).
    pub tool: String,
    /// Directory holding `sql/` and `scripts/` of the demo project.
    pub project_root: PathBuf,
    /// Warehouse database holding the demo objects.
    pub database: String,
    /// Schema holding the demo objects.
    pub schema: String,
    /// Per-invocation timeouts.
    pub timeouts: Timeouts,
    /// Reset sequencer scripts.
    pub reset_scripts: ResetScripts,
    /// Optional readiness poll.
    pub readiness: Option<ReadinessSettings>,
}

/// Values taken from the process environment; they win over the file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    /// Explicit settings file.
    pub config_path: Option<PathBuf>,
    /// Remote query tool.
    pub tool: Option<String>,
    /// Project root.
    pub project_root: Option<PathBuf>,
    /// Default connection.
    pub connection: Option<String>,
}

impl Overrides {
    /// Reads the `C360_DEMO_*` variables.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            config_path: var(CONFIG_ENV).map(PathBuf::from),
            tool: var(TOOL_ENV),
            project_root: var(ROOT_ENV).map(PathBuf::from),
            connection: var(CONNECTION_ENV),
        }
    }
}

impl Settings {
    /// Loads settings using the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(Overrides::from_env())
    }

    /// Loads settings from the file named by `overrides` (or the default
    /// location) and applies the overrides on top.
    pub fn load_with(overrides: Overrides) -> Result<Self, ConfigError> {
        let path = overrides.config_path.clone().or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawSettings::default(),
        };
        let cwd = std::env::current_dir().map_err(|source| ConfigError::CurrentDir { source })?;
        let settings = convert(path, data, overrides, &cwd)?;
        tracing::debug!(
            path = ?settings.path,
            tool = %settings.tool,
            root = %settings.project_root.display(),
            "config.loaded"
        );
        Ok(settings)
    }

    /// File the settings were read from (or would be read from).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Resolves a project-relative asset path.
    pub fn asset(&self, relative: impl AsRef<Path>) -> PathBuf {
        let relative = relative.as_ref();
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.project_root.join(relative)
        }
    }

    /// Fully qualified `DATABASE.SCHEMA` prefix.
    pub fn qualified_schema(&self) -> String {
        format!("{}.{}", self.database, self.schema)
    }
}

fn read_file(path: &Path) -> Result<RawSettings, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn convert(
    path: Option<PathBuf>,
    raw: RawSettings,
    overrides: Overrides,
    cwd: &Path,
) -> Result<Settings, ConfigError> {
    let tool = overrides
        .tool
        .or(raw.tool)
        .unwrap_or_else(|| DEFAULT_TOOL.to_string());
    if tool.trim().is_empty() {
        return Err(ConfigError::Invalid {
            key: "tool",
            reason: "must not be empty".into(),
        });
    }

    let root = overrides
        .project_root
        .or(raw.project_root)
        .unwrap_or_else(|| cwd.to_path_buf());
    let project_root = if root.is_absolute() {
        root
    } else {
        cwd.join(root)
    };

    let timeouts = Timeouts {
        probe: seconds("timeouts.probe_secs", raw.timeouts.probe_secs, DEFAULT_PROBE_SECS)?,
        script: seconds(
            "timeouts.script_secs",
            raw.timeouts.script_secs,
            DEFAULT_SCRIPT_SECS,
        )?,
        query: seconds("timeouts.query_secs", raw.timeouts.query_secs, DEFAULT_QUERY_SECS)?,
    };

    let defaults = ResetScripts::default();
    let reset_scripts = ResetScripts {
        cleanup: raw.scripts.cleanup.unwrap_or(defaults.cleanup),
        setup: raw.scripts.setup.unwrap_or(defaults.setup),
        load: raw.scripts.load.unwrap_or(defaults.load),
    };

    let readiness = raw.readiness.map(convert_readiness).transpose()?;

    Ok(Settings {
        path,
        default_connection: overrides.connection.or(raw.default_connection),
        tool,
        project_root,
        database: non_empty_or(raw.database, DEFAULT_DATABASE),
        schema: non_empty_or(raw.schema, DEFAULT_SCHEMA),
        timeouts,
        reset_scripts,
        readiness,
    })
}

fn convert_readiness(raw: RawReadiness) -> Result<ReadinessSettings, ConfigError> {
    if raw.query.trim().is_empty() {
        return Err(ConfigError::Invalid {
            key: "readiness.query",
            reason: "must not be empty".into(),
        });
    }
    if raw.ready_marker.trim().is_empty() {
        return Err(ConfigError::Invalid {
            key: "readiness.ready_marker",
            reason: "must not be empty".into(),
        });
    }
    Ok(ReadinessSettings {
        query: raw.query,
        ready_marker: raw.ready_marker,
        interval: seconds(
            "readiness.interval_secs",
            raw.interval_secs,
            DEFAULT_POLL_INTERVAL_SECS,
        )?,
        timeout: seconds(
            "readiness.timeout_secs",
            raw.timeout_secs,
            DEFAULT_POLL_TIMEOUT_SECS,
        )?,
    })
}

fn seconds(key: &'static str, value: Option<u64>, default: u64) -> Result<Duration, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".into(),
        }),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Ok(Duration::from_secs(default)),
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    #[serde(default)]
    default_connection: Option<String>,
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    project_root: Option<PathBuf>,
    #[serde(default)]
    database: Option<String>,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default)]
    timeouts: RawTimeouts,
    #[serde(default)]
    scripts: RawScripts,
    #[serde(default)]
    readiness: Option<RawReadiness>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawTimeouts {
    probe_secs: Option<u64>,
    script_secs: Option<u64>,
    query_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawScripts {
    cleanup: Option<PathBuf>,
    setup: Option<PathBuf>,
    load: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawReadiness {
    query: String,
    ready_marker: String,
    interval_secs: Option<u64>,
    timeout_secs: Option<u64>,
}

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings {path}: {source}")]
    Read {
        /// Settings file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The settings file is not valid TOML for this schema.
    #[error("failed to parse settings {path}: {source}")]
    Parse {
        /// Settings file.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
    /// A value parsed but is not acceptable.
    #[error("invalid setting '{key}': {reason}")]
    Invalid {
        /// Dotted key of the offending value.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// The working directory could not be determined.
    #[error("failed to resolve current directory: {source}")]
    CurrentDir {
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Default settings location under the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("c360-demo").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load_file(contents: &str) -> (TempDir, Result<Settings, ConfigError>) {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write settings");
        let result = Settings::load_with(Overrides {
            config_path: Some(path),
            ..Overrides::default()
        });
        (dir, result)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let settings = Settings::load_with(Overrides {
            config_path: Some(dir.path().join("absent.toml")),
            ..Overrides::default()
        })
        .expect("defaults");
        assert_eq!(settings.tool, "snowsql");
        assert_eq!(settings.qualified_schema(), "CUSTOMER_360_DB.PUBLIC");
        assert_eq!(settings.timeouts, Timeouts::default());
        assert_eq!(settings.reset_scripts, ResetScripts::default());
        assert!(settings.readiness.is_none());
        assert!(settings.default_connection.is_none());
    }

    #[test]
    fn file_values_are_applied() {
        let (_dir, result) = load_file(
            r#"
default_connection = "demo_admin"
project_root = "/srv/c360"
database = "SALES_DEMO"

[timeouts]
script_secs = 600

[scripts]
setup = "sql/alt_setup.sql"

[readiness]
query = "SHOW CORTEX SEARCH SERVICES"
ready_marker = "ACTIVE"
interval_secs = 5
"#,
        );
        let settings = result.expect("parse");
        assert_eq!(settings.default_connection.as_deref(), Some("demo_admin"));
        assert_eq!(settings.project_root, PathBuf::from("/srv/c360"));
        assert_eq!(settings.qualified_schema(), "SALES_DEMO.PUBLIC");
        assert_eq!(settings.timeouts.script, Duration::from_secs(600));
        assert_eq!(settings.timeouts.probe, Duration::from_secs(30));
        assert_eq!(settings.reset_scripts.setup, PathBuf::from("sql/alt_setup.sql"));
        assert_eq!(
            settings.asset(&settings.reset_scripts.setup),
            PathBuf::from("/srv/c360/sql/alt_setup.sql")
        );
        let readiness = settings.readiness.expect("readiness");
        assert_eq!(readiness.interval, Duration::from_secs(5));
        assert_eq!(readiness.timeout, Duration::from_secs(900));
    }

    #[test]
    fn overrides_win_over_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "tool = \"snowsql\"\ndefault_connection = \"file\"\n").expect("write");
        let settings = Settings::load_with(Overrides {
            config_path: Some(path),
            tool: Some("/opt/fake/snowsql".into()),
            project_root: Some(dir.path().to_path_buf()),
            connection: Some("env".into()),
        })
        .expect("load");
        assert_eq!(settings.tool, "/opt/fake/snowsql");
        assert_eq!(settings.default_connection.as_deref(), Some("env"));
        assert_eq!(settings.project_root, dir.path());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let (_dir, result) = load_file("tool = [unterminated");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let (_dir, result) = load_file("warehouse_size = \"XL\"\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let (_dir, result) = load_file("[timeouts]\nprobe_secs = 0\n");
        match result {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "timeouts.probe_secs"),
            other => panic!("expected invalid timeout, got {other:?}"),
        }
    }

    #[test]
    fn readiness_requires_marker() {
        let (_dir, result) = load_file("[readiness]\nquery = \"SELECT 1\"\nready_marker = \" \"\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "readiness.ready_marker",
                ..
            })
        ));
    }

    #[test]
    fn empty_tool_is_invalid() {
        let (_dir, result) = load_file("tool = \"  \"\n");
        assert!(matches!(result, Err(ConfigError::Invalid { key: "tool", .. })));
    }
}
