//! CLI argument structures and output enums for the movewise binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use movewise_rs::AlgorithmKind;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Move-method and move-field refactoring recommendations
#[derive(Parser)]
#[command(name = "movewise")]
#[command(version = VERSION)]
#[command(about = "Movewise - move-method refactoring recommendations from entity clustering")]
#[command(long_about = "
Read an entity corpus produced by an extraction tool and run one or more
refactoring search algorithms over it.

Common Usage:

  # Run every algorithm enabled in the default configuration
  movewise analyze --input corpus.json

  # Run only HAC and CCDA, emit JSON
  movewise analyze --input corpus.json --algorithm hac --algorithm ccda --format json

  # Start from a saved configuration
  movewise print-default-config > movewise.yml
  movewise analyze --input corpus.json --config movewise.yml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search a corpus for move refactorings
    Analyze(AnalyzeArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Validate a movewise configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),

    /// List the built-in algorithms
    #[command(name = "list-algorithms")]
    ListAlgorithms,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Entity corpus in JSON format
    #[arg(short, long)]
    pub input: PathBuf,

    /// Configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Algorithms to run instead of the configured ones (repeatable)
    #[arg(short, long = "algorithm")]
    pub algorithms: Vec<AlgorithmKind>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Worker thread count
    #[arg(long)]
    pub threads: Option<usize>,

    /// Drop suggestions below this accuracy
    #[arg(long)]
    pub min_accuracy: Option<f64>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Configuration file to validate
    pub config: PathBuf,

    /// Show every algorithm setting
    #[arg(short, long)]
    pub detailed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    Table,
    /// Machine-readable JSON
    Json,
}
