//! groundtrack CLI - Command-line interface
//!
//! This binary exercises the groundtrack library: it can run a simulated
//! vehicle through the position tracker and manage the configuration file.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "groundtrack")]
#[command(version = groundtrack::VERSION)]
#[command(about = "Dead-reckoned vehicle position tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated vehicle and compare estimates against ground truth
    Simulate(SimulateArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
