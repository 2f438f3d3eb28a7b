//! Movewise CLI - move-method refactoring recommendations
//!
//! Reads an entity corpus, runs the configured search algorithms and prints
//! the ranked suggestions as tables or JSON.

use clap::Parser;

mod cli;

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze(args) => cli::analyze_command(args)?,
        Commands::PrintDefaultConfig => cli::print_default_config()?,
        Commands::ValidateConfig(args) => cli::validate_config(args)?,
        Commands::ListAlgorithms => cli::list_algorithms()?,
    }

    Ok(())
}
