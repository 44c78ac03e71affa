//! Binary entry point for the one-shot demo reset.
#![forbid(unsafe_code)]

use std::process;

use c360_demo::{
    cli::{init_tracing, LinePrompt, Theme, Ui},
    config::Settings,
    remote::SnowSql,
    sequence::{ResetPlan, Sequencer, TokioClock},
    ProvisionError,
};
use clap::{error::ErrorKind, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "reset-demo",
    about = "Drop and rebuild the Customer 360 demo in one pass",
    disable_version_flag = true
)]
struct Cli {
    #[arg(
        short = 'c',
        long = "config",
        value_name = "CONNECTION",
        help = "Named connection to use (default: the tool's default connection)"
    )]
    connection: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let help = matches!(err.kind(), ErrorKind::DisplayHelp);
            let _ = err.print();
            process::exit(if help { 0 } else { 1 });
        }
    };

    init_tracing();
    let ui = Ui::new(Theme::Auto, false);
    if let Err(err) = run(cli, &ui).await {
        report(&ui, &err);
        process::exit(err.exit_code());
    }
}

async fn run(cli: Cli, ui: &Ui) -> Result<(), ProvisionError> {
    let settings = Settings::load()?;
    let plan = ResetPlan::from_settings(&settings, cli.connection);
    let tool = SnowSql::new(settings.tool.clone());
    let clock = TokioClock;
    let mut prompt = LinePrompt::stdin();
    Sequencer::new(&tool, &clock, ui)
        .run(&plan, &mut prompt)
        .await?;
    Ok(())
}

fn report(ui: &Ui, err: &ProvisionError) {
    ui.error(&format!("error: {err}"));
    if let Some(detail) = err.remote_detail() {
        eprintln!("{detail}");
    }
}
