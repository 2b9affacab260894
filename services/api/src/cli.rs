use crate::demo::{
    run_demo, run_fleet, run_score, run_simulate, DemoArgs, FleetArgs, ScoreArgs, SimulateArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use conflict_risk::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Conflict Risk Engine",
    about = "Score, simulate, and monitor geopolitical conflict risk from the command line",
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
    /// Score a single set of component inputs
    Score(ScoreArgs),
    /// Run a what-if scenario against a set of component inputs
    Simulate(SimulateArgs),
    /// Print threshold alerts and tier statistics for a dataset
    Fleet(FleetArgs),
    /// Walk through scoring, alerts, and scenarios on the bundled sample fleet
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
    /// CSV dataset to serve instead of the bundled sample
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Simulate(args) => run_simulate(args),
        Command::Fleet(args) => run_fleet(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
