//! Suggestion and run-result types produced by the refactoring search.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::core::errors::MovewiseError;

/// A suggested move of one method or field to another class.
///
/// Two suggestions are equal when they move the same unit to the same target,
/// whatever their accuracy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refactoring {
    unit: String,
    target: String,
    accuracy: f64,
    is_field: bool,
}

impl Refactoring {
    /// Create a suggestion; accuracy is clamped into `[0, 1]`.
    pub fn new(
        unit: impl Into<String>,
        target: impl Into<String>,
        accuracy: f64,
        is_field: bool,
    ) -> Self {
        let accuracy = if accuracy.is_nan() {
            0.0
        } else {
            accuracy.clamp(0.0, 1.0)
        };
        Self {
            unit: unit.into(),
            target: target.into(),
            accuracy,
            is_field,
        }
    }

    /// Qualified name of the entity to move
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Class the entity should move to
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Confidence in `[0, 1]`
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// True for a field move
    pub fn is_field(&self) -> bool {
        self.is_field
    }
}

impl PartialEq for Refactoring {
    fn eq(&self, other: &Self) -> bool {
        self.unit == other.unit && self.target == other.target
    }
}

impl Eq for Refactoring {}

impl Hash for Refactoring {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.unit.hash(state);
        self.target.hash(state);
    }
}

/// Sort by descending accuracy, then by unit and target.
pub fn sort_refactorings(refactorings: &mut [Refactoring]) {
    refactorings.sort_by(|a, b| {
        b.accuracy
            .total_cmp(&a.accuracy)
            .then_with(|| a.unit.cmp(&b.unit))
            .then_with(|| a.target.cmp(&b.target))
    });
}

/// Merge suggestions from several runs, keeping the most accurate duplicate.
pub fn merge_refactorings<'a, I>(refactorings: I) -> Vec<Refactoring>
where
    I: IntoIterator<Item = &'a Refactoring>,
{
    let mut best: HashMap<(&str, &str), &Refactoring> = HashMap::new();
    for refactoring in refactorings {
        best.entry((refactoring.unit(), refactoring.target()))
            .and_modify(|current| {
                if refactoring.accuracy > current.accuracy {
                    *current = refactoring;
                }
            })
            .or_insert(refactoring);
    }
    let mut merged: Vec<Refactoring> = best.into_values().cloned().collect();
    sort_refactorings(&mut merged);
    merged
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

fn serialize_error<S: Serializer>(
    error: &Option<MovewiseError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Outcome of one algorithm invocation.
///
/// A failed run keeps its error next to an empty suggestion list instead of
/// raising it through the caller.
#[derive(Debug, Serialize)]
pub struct AlgorithmResult {
    algorithm: String,
    refactorings: Vec<Refactoring>,
    #[serde(rename = "execution_time_ms", serialize_with = "serialize_millis")]
    execution_time: Duration,
    threads_used: usize,
    #[serde(serialize_with = "serialize_error", skip_serializing_if = "Option::is_none")]
    error: Option<MovewiseError>,
}

impl AlgorithmResult {
    /// Successful run
    pub fn success(
        algorithm: impl Into<String>,
        refactorings: Vec<Refactoring>,
        execution_time: Duration,
        threads_used: usize,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            refactorings,
            execution_time,
            threads_used,
            error: None,
        }
    }

    /// Failed run carrying its error
    pub fn failure(
        algorithm: impl Into<String>,
        error: MovewiseError,
        execution_time: Duration,
        threads_used: usize,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            refactorings: Vec::new(),
            execution_time,
            threads_used,
            error: Some(error),
        }
    }

    /// Algorithm name
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Suggestions, best first
    pub fn refactorings(&self) -> &[Refactoring] {
        &self.refactorings
    }

    /// Wall-clock time of the run
    pub fn execution_time(&self) -> Duration {
        self.execution_time
    }

    /// Pool threads available to the run
    pub fn threads_used(&self) -> usize {
        self.threads_used
    }

    /// Captured failure, if any
    pub fn error(&self) -> Option<&MovewiseError> {
        self.error.as_ref()
    }

    /// True when the run completed without error
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Compact summary for reporting
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            algorithm_name: self.algorithm.clone(),
            refactoring_count: self.refactorings.len(),
            execution_time_ms: u64::try_from(self.execution_time.as_millis()).unwrap_or(u64::MAX),
            threads_used: self.threads_used,
        }
    }
}

/// Run summary handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Algorithm name
    pub algorithm_name: String,
    /// Number of suggestions produced
    pub refactoring_count: usize,
    /// Wall-clock time in milliseconds
    pub execution_time_ms: u64,
    /// Pool threads available to the run
    pub threads_used: usize,
}
