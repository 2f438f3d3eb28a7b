//! Command execution for the movewise binary.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use owo_colors::OwoColorize;
use tabled::settings::Style as TableStyle;
use tabled::{Table, Tabled};
use tracing::info;

use movewise_rs::{
    AlgorithmKind, CancellationToken, EntityCorpus, MovewiseConfig, ProgressListener,
    RefactoringEngine,
};

use crate::cli::args::{AnalyzeArgs, OutputFormat, ValidateConfigArgs};
use crate::cli::output::{print_json, print_tables, BarListener};

/// Load configuration from file or use defaults
pub fn load_configuration(path: Option<&Path>) -> anyhow::Result<MovewiseConfig> {
    match path {
        Some(path) => {
            let config = MovewiseConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(MovewiseConfig::default()),
    }
}

/// Read an entity corpus from JSON
pub fn load_corpus(path: &Path) -> anyhow::Result<EntityCorpus> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file {}", path.display()))?;
    let corpus: EntityCorpus = serde_json::from_str(&content)
        .with_context(|| format!("Invalid corpus in {}", path.display()))?;
    info!(
        "Loaded corpus: {} classes, {} methods, {} fields",
        corpus.classes().len(),
        corpus.methods().len(),
        corpus.fields().len()
    );
    Ok(corpus)
}

/// Run the refactoring search
pub fn analyze_command(args: AnalyzeArgs) -> anyhow::Result<()> {
    let mut config = load_configuration(args.config.as_deref())?;
    if !args.algorithms.is_empty() {
        config.algorithms.enabled = args.algorithms.clone();
    }
    if let Some(threads) = args.threads {
        config.performance.max_threads = Some(threads);
    }
    if let Some(min_accuracy) = args.min_accuracy {
        config.output.min_accuracy = min_accuracy;
    }

    let corpus = load_corpus(&args.input)?;
    let mut engine = RefactoringEngine::new(config)?;

    let bar = if args.format == OutputFormat::Table && !args.no_progress {
        Some(BarListener::new()?)
    } else {
        None
    };
    if let Some(bar) = &bar {
        let listener: Arc<dyn ProgressListener> = bar.clone();
        engine = engine.with_progress_listener(listener);
    }

    let outcome = engine.run_all(&corpus, &CancellationToken::new());
    if let Some(bar) = &bar {
        bar.finish();
    }
    let results = outcome?;
    let merged = RefactoringEngine::merge_suggestions(&results);

    match args.format {
        OutputFormat::Table => print_tables(&results, &merged),
        OutputFormat::Json => print_json(&results, &merged)?,
    }
    Ok(())
}

/// Print default configuration
pub fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default movewise configuration".dimmed());
    println!("{}", "# Save this to a file and customize as needed".dimmed());
    println!("{}", "# Usage: movewise analyze --input corpus.json --config your-config.yml".dimmed());
    println!();

    let yaml_output = serde_yaml::to_string(&MovewiseConfig::default())?;
    println!("{yaml_output}");
    Ok(())
}

/// Validate a configuration file
pub fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        args.config.display().to_string().cyan()
    );
    println!();

    let config = match load_configuration(Some(args.config.as_path())) {
        Ok(config) => {
            println!("{}", "✅ Configuration file is valid!".bright_green().bold());
            println!();
            config
        }
        Err(e) => {
            eprintln!("{} {:#}", "❌ Configuration validation failed:".red(), e);
            println!();
            println!("{}", "💡 Tip: Use 'movewise print-default-config' to see valid format".dimmed());
            std::process::exit(1);
        }
    };

    #[derive(Tabled)]
    struct SettingRow {
        setting: &'static str,
        value: String,
    }

    let mut rows = vec![
        SettingRow {
            setting: "Enabled algorithms",
            value: config
                .algorithms
                .enabled
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        },
        SettingRow {
            setting: "Max threads",
            value: config
                .performance
                .max_threads
                .map_or_else(|| "auto".to_string(), |t| t.to_string()),
        },
        SettingRow {
            setting: "Min accuracy",
            value: config.output.min_accuracy.to_string(),
        },
    ];
    if args.detailed {
        let algorithms = &config.algorithms;
        rows.extend([
            SettingRow {
                setting: "Nearest-centroid min candidates",
                value: algorithms.nearest_centroid.min_candidates.to_string(),
            },
            SettingRow {
                setting: "AKMeans max steps",
                value: algorithms.akmeans.max_steps.to_string(),
            },
            SettingRow {
                setting: "AKMeans seed",
                value: algorithms
                    .akmeans
                    .seed
                    .map_or_else(|| "random".to_string(), |s| s.to_string()),
            },
            SettingRow {
                setting: "CCDA epsilon",
                value: algorithms.ccda.epsilon.to_string(),
            },
            SettingRow {
                setting: "CCDA max iterations",
                value: algorithms.ccda.max_iterations.to_string(),
            },
            SettingRow {
                setting: "HAC distance cutoff",
                value: algorithms.hac.distance_cutoff.to_string(),
            },
            SettingRow {
                setting: "RMMR weights (conceptual/contextual)",
                value: format!(
                    "{}/{}",
                    algorithms.rmmr.conceptual_weight, algorithms.rmmr.contextual_weight
                ),
            },
        ]);
    }

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
    Ok(())
}

/// List the built-in algorithms
pub fn list_algorithms() -> anyhow::Result<()> {
    println!("{}", "🧮 Refactoring Algorithms".bright_blue().bold());
    println!();

    #[derive(Tabled)]
    struct AlgorithmRow {
        name: &'static str,
        key: String,
        default: &'static str,
        description: &'static str,
    }

    let defaults = MovewiseConfig::default().algorithms.enabled;
    let rows: Vec<AlgorithmRow> = AlgorithmKind::ALL
        .into_iter()
        .map(|kind| AlgorithmRow {
            name: kind.name(),
            key: kind.name().to_lowercase(),
            default: if defaults.contains(&kind) { "✅" } else { "" },
            description: kind.description(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
    Ok(())
}
