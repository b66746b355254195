use crate::demo::{run_demo, run_select, DemoArgs, SelectArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use quote_optimizer::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Quote Optimizer",
    about = "Score supplier offers against an RFQ and pick the one with the best expected value",
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
    /// Score an RFQ and its offers read from JSON files and print the ranking
    Select(SelectArgs),
    /// Run the quoting flow on a deterministic mock RFQ and offer set
    Demo(DemoArgs),
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
        Command::Select(args) => run_select(args),
        Command::Demo(args) => run_demo(args),
    }
}
