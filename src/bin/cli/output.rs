//! Progress display and result rendering.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use serde::Serialize;
use tabled::settings::Style as TableStyle;
use tabled::{Table, Tabled};

use movewise_rs::{AlgorithmResult, ProgressListener, Refactoring, RunSummary};

/// Progress bar fed by the engine; restarts whenever a new algorithm reports.
pub struct BarListener {
    bar: ProgressBar,
    current: Mutex<String>,
}

impl BarListener {
    pub fn new() -> anyhow::Result<Arc<Self>> {
        let bar = ProgressBar::new(100);
        bar.set_style(ProgressStyle::with_template(
            "🚀 {msg:>8} [{bar:40.bright_blue/blue}] {pos:>3}% {elapsed_precise}",
        )?);
        Ok(Arc::new(Self {
            bar,
            current: Mutex::new(String::new()),
        }))
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressListener for BarListener {
    fn on_progress(&self, algorithm: &str, fraction: f64) {
        let mut current = self.current.lock();
        if *current != algorithm {
            current.clear();
            current.push_str(algorithm);
            self.bar.reset();
            self.bar.set_message(algorithm.to_string());
        }
        self.bar.set_position((fraction * 100.0).round() as u64);
    }
}

#[derive(Tabled)]
struct SuggestionRow {
    unit: String,
    target: String,
    accuracy: String,
    kind: &'static str,
}

impl From<&Refactoring> for SuggestionRow {
    fn from(r: &Refactoring) -> Self {
        Self {
            unit: r.unit().to_string(),
            target: r.target().to_string(),
            accuracy: format!("{:.3}", r.accuracy()),
            kind: if r.is_field() { "field" } else { "method" },
        }
    }
}

#[derive(Tabled)]
struct SummaryRow {
    algorithm: String,
    suggestions: usize,
    time_ms: u64,
    threads: usize,
    status: String,
}

/// Print per-algorithm summaries and the merged suggestion table.
pub fn print_tables(results: &[AlgorithmResult], merged: &[Refactoring]) {
    println!("{}", "📊 Algorithm Runs".bright_blue().bold());
    let rows: Vec<SummaryRow> = results
        .iter()
        .map(|result| {
            let RunSummary {
                algorithm_name,
                refactoring_count,
                execution_time_ms,
                threads_used,
            } = result.summary();
            SummaryRow {
                algorithm: algorithm_name,
                suggestions: refactoring_count,
                time_ms: execution_time_ms,
                threads: threads_used,
                status: match result.error() {
                    Some(err) => format!("❌ {err}"),
                    None => "✅ ok".to_string(),
                },
            }
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
    println!();

    if merged.is_empty() {
        println!("{}", "No move refactorings suggested.".dimmed());
        return;
    }
    println!(
        "{} {}",
        "🔧 Suggested Moves".bright_blue().bold(),
        format!("({})", merged.len()).dimmed()
    );
    let mut table = Table::new(merged.iter().map(SuggestionRow::from));
    table.with(TableStyle::rounded());
    println!("{table}");
}

#[derive(Serialize)]
struct JsonReport<'a> {
    runs: &'a [AlgorithmResult],
    suggestions: &'a [Refactoring],
}

/// Print results as one JSON document.
pub fn print_json(results: &[AlgorithmResult], merged: &[Refactoring]) -> anyhow::Result<()> {
    let report = JsonReport {
        runs: results,
        suggestions: merged,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
