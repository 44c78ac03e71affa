use serde::Serialize;

/// Default number of rows at which a sample table counts as fully loaded.
pub const DEFAULT_GOOD_ROWS: u64 = 5;

/// What a check looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CheckKind {
    /// Sample-data table, graded by row count.
    Table {
        /// Rows needed for `good`.
        good_rows: u64,
    },
    /// Search service in the metadata views.
    SearchService,
    /// User-defined function in the metadata views.
    Function,
    /// Named stage in the metadata views.
    Stage,
}

/// One read-only query of the status batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Check {
    /// Object name as reported.
    pub name: String,
    /// How the count is interpreted.
    #[serde(flatten)]
    pub kind: CheckKind,
    /// Scalar count query.
    pub sql: String,
}

const TABLES: [(&str, u64); 5] = [
    ("CUSTOMERS", DEFAULT_GOOD_ROWS),
    ("CUSTOMER_ACTIVITIES", DEFAULT_GOOD_ROWS),
    ("PURCHASES", DEFAULT_GOOD_ROWS),
    ("SUPPORT_TICKETS", DEFAULT_GOOD_ROWS),
    ("CUSTOMER_DOCUMENTS", DEFAULT_GOOD_ROWS),
];

const SEARCH_SERVICES: [&str; 1] = ["CUSTOMER_DOCUMENTS_SEARCH"];

const FUNCTIONS: [&str; 2] = ["ASK_CUSTOMER_360_AI", "SEARCH_CUSTOMER_DOCUMENTS_TEXT"];

const STAGES: [&str; 1] = ["CUSTOMER_360_SEMANTIC_MODEL_STAGE"];

/// Row threshold for a known sample table.
pub fn good_rows_for(table: &str) -> Option<u64> {
    TABLES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(table))
        .map(|(_, rows)| *rows)
}

/// The full status batch for `database.schema`.
pub fn checks(database: &str, schema: &str) -> Vec<Check> {
    let mut checks = Vec::with_capacity(TABLES.len() + SEARCH_SERVICES.len() + FUNCTIONS.len() + STAGES.len());
    for (table, good_rows) in TABLES {
        checks.push(Check {
            name: table.to_string(),
            kind: CheckKind::Table { good_rows },
            sql: format!("SELECT COUNT(*) FROM {database}.{schema}.{table};"),
        });
    }
    for service in SEARCH_SERVICES {
        checks.push(metadata_check(
            service,
            CheckKind::SearchService,
            database,
            "CORTEX_SEARCH_SERVICES",
            "SERVICE_SCHEMA",
            "SERVICE_NAME",
            schema,
        ));
    }
    for function in FUNCTIONS {
        checks.push(metadata_check(
            function,
            CheckKind::Function,
            database,
            "FUNCTIONS",
            "FUNCTION_SCHEMA",
            "FUNCTION_NAME",
            schema,
        ));
    }
    for stage in STAGES {
        checks.push(metadata_check(
            stage,
            CheckKind::Stage,
            database,
            "STAGES",
            "STAGE_SCHEMA",
            "STAGE_NAME",
            schema,
        ));
    }
    checks
}

fn metadata_check(
    name: &str,
    kind: CheckKind,
    database: &str,
    view: &str,
    schema_column: &str,
    name_column: &str,
    schema: &str,
) -> Check {
    Check {
        name: name.to_string(),
        kind,
        sql: format!(
            "SELECT COUNT(*) FROM {database}.INFORMATION_SCHEMA.{view} \
             WHERE {schema_column} = '{schema}' AND {name_column} = '{name}';"
        ),
    }
}

/// Per-table row counts, printed raw at the end of a reset.
pub fn verification_query(qualified_schema: &str) -> String {
    let selects: Vec<String> = TABLES
        .iter()
        .map(|(table, _)| {
            format!("SELECT '{table}' AS table_name, COUNT(*) AS row_count FROM {qualified_schema}.{table}")
        })
        .collect();
    format!("{} ORDER BY table_name;", selects.join(" UNION ALL "))
}
