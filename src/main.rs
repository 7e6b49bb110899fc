//! Stratify: experiment grouping CLI
//!
//! Loads a subject table, deals subjects into balanced groups and refines
//! stored groupings.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use stratify::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Group(args) => commands::run_group(args),
        Commands::FineTune(args) => commands::run_fine_tune(args),
        Commands::Sample(args) => commands::run_sample(args),
        Commands::Stats(args) => commands::run_stats(args),
        Commands::List { store } => commands::run_list(store),
    }
}
