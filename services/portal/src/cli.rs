use crate::commands::{
    run_export, run_login, run_quick_summary, run_summary, ExportArgs, LoginArgs,
    QuickSummaryArgs, SummaryArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use work_report::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Work Report Portal",
    about = "Serve and inspect daily work-report summaries from the command line",
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
    /// Build summaries and exports from a snapshot or the live backend
    Reports {
        #[command(subcommand)]
        command: ReportsCommand,
    },
    /// Sign in against the backend and print the issued token
    Login(LoginArgs),
}

#[derive(Subcommand, Debug)]
enum ReportsCommand {
    /// Print the grouped summary table
    Summary(SummaryArgs),
    /// Print per-team reporting counts and per-manager attendance for a date
    QuickSummary(QuickSummaryArgs),
    /// Write a dated CSV or PDF export into the export directory
    Export(ExportArgs),
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
        Command::Reports {
            command: ReportsCommand::Summary(args),
        } => run_summary(args).await,
        Command::Reports {
            command: ReportsCommand::QuickSummary(args),
        } => run_quick_summary(args).await,
        Command::Reports {
            command: ReportsCommand::Export(args),
        } => run_export(args).await,
        Command::Login(args) => run_login(args).await,
    }
}
