//! Stroke predictor training CLI
//!
//! Entry points for the offline half of the model lifecycle: plain
//! training, hyperparameter search with experiment tracking, and
//! tracking-store provisioning.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{initdb, train, tune};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Stroke Predictor CLI
#[derive(Parser)]
#[command(name = "strokectl")]
#[command(author, version, about = "CLI for the Stroke Predictor model lifecycle", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a classifier on a holdout split and save the artifact to disk
    Train(train::TrainArgs),

    /// Random-search hyperparameters under cross-validation and register
    /// the best model
    Tune(tune::TuneArgs),

    /// Provision the tracking-store database file
    InitDb(initdb::InitDbArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().compact())
        .init();

    match cli.command {
        Commands::Train(args) => train::run(args),
        Commands::Tune(args) => tune::run(args),
        Commands::InitDb(args) => initdb::run(args),
    }
}
