use crate::server;
use clap::{Args, Parser, Subcommand};
use principle::error::AppError;
use principle::workflows::principle::status_table;

#[derive(Parser, Debug)]
#[command(
    name = "Principle Orchestrator",
    about = "Run the principle loan-application orchestrator from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the decision/step status lookup table
    StatusTable,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::StatusTable => {
            for line in render_status_table() {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn render_status_table() -> Vec<String> {
    let mut lines = vec![format!(
        "{:<8} {:<18} {:<28} {}",
        "DECISION", "STEP", "LABEL", "COLOR"
    )];
    lines.extend(status_table().into_iter().map(|(decision, step, display)| {
        format!(
            "{:<8} {:<18} {:<28} {}",
            decision.label(),
            step.label(),
            display.label,
            display.color
        )
    }));
    lines
}
