//! Binary entry point for the interactive demo manager.
#![forbid(unsafe_code)]

use std::io::{self, Write};
use std::process;

use c360_demo::{
    cli::{init_tracing, LinePrompt, Theme, Ui},
    config::{Overrides, Settings},
    manager::{print_next_steps, select_connection, DemoManager},
    remote::{self, SnowSql},
    sequence::TokioClock,
    status::{self, Verdict},
    ProvisionError,
};
use clap::{error::ErrorKind, Parser, Subcommand, ValueEnum};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "demo-manager",
    version,
    about = "Step-by-step management of the Customer 360 demo",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "NAME",
        help = "Named connection (prompted for in the menu when omitted)"
    )]
    connection: Option<String>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = Theme::Auto,
        help = "Color theme for operator output"
    )]
    theme: Theme,

    #[arg(long, global = true, help = "Suppress decorative output")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive numbered menu (default).
    Menu,
    /// Drop every demo object.
    Cleanup {
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
    /// Create the database, the tables and the sample data.
    SetupDatabase,
    /// Create the search services.
    SetupSearch,
    /// Create the agent after the semantic model upload.
    SetupAgent {
        #[arg(long, help = "The semantic model is already uploaded to the stage")]
        uploaded: bool,
    },
    /// Run every setup step, continuing past failures.
    Complete {
        #[arg(long, help = "Skip the cleanup confirmation prompt")]
        yes: bool,
        #[arg(long, help = "The semantic model is already uploaded to the stage")]
        uploaded: bool,
    },
    /// Report demo readiness.
    Status,
    /// Print the follow-up checklist.
    NextSteps,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct StepReport {
    step: &'static str,
    completed: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let informational = matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            );
            let _ = err.print();
            process::exit(if informational { 0 } else { 1 });
        }
    };
    init_tracing();
    let mut ui = Ui::new(cli.theme, cli.quiet);
    if let OutputFormat::Json = cli.format {
        ui = ui.on_stderr();
    }
    match run(cli, &ui).await {
        Ok(code) => process::exit(code),
        Err(err) => {
            ui.error(&format!("error: {err}"));
            if let Some(detail) = err.remote_detail() {
                eprintln!("{detail}");
            }
            process::exit(err.exit_code());
        }
    }
}

async fn run(cli: Cli, ui: &Ui) -> Result<i32, ProvisionError> {
    let mut overrides = Overrides::from_env();
    if cli.connection.is_some() {
        overrides.connection = cli.connection.clone();
    }
    let settings = Settings::load_with(overrides)?;
    let command = cli.command.unwrap_or(Command::Menu);
    if let Command::NextSteps = command {
        print_next_steps(ui);
        return Ok(0);
    }

    let tool = SnowSql::new(settings.tool.clone());
    let clock = TokioClock;
    let questions: Box<dyn Write> = if ui.writes_stderr() {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };
    let mut prompt = LinePrompt::new(io::stdin().lock(), questions);
    let timeout = settings.timeouts.probe;
    let version = remote::ensure_installed(&tool, timeout).await?;
    tracing::info!(%version, "manager.tool.found");

    let connection = match command {
        Command::Menu => {
            match select_connection(
                &tool,
                ui,
                &mut prompt,
                settings.default_connection.clone(),
                timeout,
            )
            .await?
            {
                Some(name) => Some(name),
                None => return Ok(0),
            }
        }
        _ => {
            let connection = settings.default_connection.clone();
            remote::probe(&tool, connection.as_deref(), timeout).await?;
            connection
        }
    };

    let manager = DemoManager::new(&tool, &clock, ui, &settings, connection);
    let format = cli.format;
    match command {
        Command::Menu => manager.run_menu(&mut prompt).await?,
        Command::Cleanup { yes } => {
            let completed = manager.cleanup(&mut prompt, yes).await?;
            emit_step(format, "cleanup", completed)?;
        }
        Command::SetupDatabase => {
            manager.setup_database().await?;
            emit_step(format, "setup-database", true)?;
        }
        Command::SetupSearch => {
            manager.setup_search().await?;
            emit_step(format, "setup-search", true)?;
        }
        Command::SetupAgent { uploaded } => {
            let completed = manager.setup_agent(&mut prompt, uploaded).await?;
            emit_step(format, "setup-agent", completed)?;
        }
        Command::Complete { yes, uploaded } => {
            let report = manager.complete_setup(&mut prompt, yes, uploaded).await;
            emit(format, &report, |_| {})?;
            if !report.success() {
                return Ok(1);
            }
        }
        Command::Status => {
            let report = manager.status().await?;
            emit(format, &report, |_| status::print_text(ui, &report))?;
            if report.verdict == Verdict::NotReady {
                return Ok(2);
            }
        }
        Command::NextSteps => {}
    }
    Ok(0)
}

fn emit_step(format: OutputFormat, step: &'static str, completed: bool) -> Result<(), ProvisionError> {
    emit(format, &StepReport { step, completed }, |_| {})
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), ProvisionError>
where
    T: Serialize,
    F: Fn(OutputFormat),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|err| ProvisionError::Message(format!("cannot encode report: {err}")))?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text),
    }
    Ok(())
}
