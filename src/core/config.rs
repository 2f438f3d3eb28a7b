//! Configuration types for movewise-rs.
//!
//! Every section deserializes with defaults for missing keys, so a YAML file
//! only has to name the values it changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::algorithms::AlgorithmKind;
use crate::core::errors::{MovewiseError, Result};

/// Main configuration for the refactoring engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovewiseConfig {
    /// Algorithm selection and tuning
    pub algorithms: AlgorithmsConfig,

    /// Thread pool sizing
    pub performance: PerformanceConfig,

    /// Filtering of reported suggestions
    pub output: OutputConfig,
}

impl MovewiseConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            MovewiseError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            MovewiseError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        self.algorithms.validate()?;
        self.performance.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

/// Algorithm selection and per-algorithm parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmsConfig {
    /// Algorithms executed by `run_all`, in order
    pub enabled: Vec<AlgorithmKind>,

    /// ARI / MRI settings
    pub nearest_centroid: NearestCentroidConfig,

    /// AKMeans settings
    pub akmeans: AkMeansConfig,

    /// CCDA settings
    pub ccda: CcdaConfig,

    /// HAC settings
    pub hac: HacConfig,

    /// RMMR settings
    pub rmmr: RmmrConfig,
}

impl Default for AlgorithmsConfig {
    fn default() -> Self {
        Self {
            enabled: vec![
                AlgorithmKind::Ari,
                AlgorithmKind::AkMeans,
                AlgorithmKind::Ccda,
                AlgorithmKind::Hac,
                AlgorithmKind::Rmmr,
            ],
            nearest_centroid: NearestCentroidConfig::default(),
            akmeans: AkMeansConfig::default(),
            ccda: CcdaConfig::default(),
            hac: HacConfig::default(),
            rmmr: RmmrConfig::default(),
        }
    }
}

impl AlgorithmsConfig {
    /// Validate every algorithm section
    pub fn validate(&self) -> Result<()> {
        if self.enabled.is_empty() {
            return Err(MovewiseError::config_field(
                "at least one algorithm must be enabled",
                "algorithms.enabled",
            ));
        }
        self.nearest_centroid.validate()?;
        self.akmeans.validate()?;
        self.ccda.validate()?;
        self.hac.validate()?;
        self.rmmr.validate()?;
        Ok(())
    }
}

/// Nearest-centroid (ARI / MRI) configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearestCentroidConfig {
    /// Minimum number of reachable classes before an entity is considered
    pub min_candidates: usize,
}

impl Default for NearestCentroidConfig {
    fn default() -> Self {
        Self { min_candidates: 2 }
    }
}

impl NearestCentroidConfig {
    /// Validate nearest-centroid configuration
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.min_candidates, "algorithms.nearest_centroid.min_candidates")
    }
}

/// Partitional clustering (AKMeans) configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AkMeansConfig {
    /// Maximum number of reassignment iterations
    pub max_steps: usize,

    /// Seed for picking initial representatives; random when absent
    pub seed: Option<u64>,
}

impl Default for AkMeansConfig {
    fn default() -> Self {
        Self {
            max_steps: 25,
            seed: None,
        }
    }
}

impl AkMeansConfig {
    /// Validate AKMeans configuration
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.max_steps, "algorithms.akmeans.max_steps")
    }
}

/// Modularity optimization (CCDA) configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcdaConfig {
    /// Moves must improve modularity by more than this
    pub epsilon: f64,

    /// Upper bound on accepted moves
    pub max_iterations: usize,
}

impl Default for CcdaConfig {
    fn default() -> Self {
        Self {
            epsilon: 5e-4,
            max_iterations: 100_000,
        }
    }
}

impl CcdaConfig {
    /// Validate CCDA configuration
    pub fn validate(&self) -> Result<()> {
        validate_positive_f64(self.epsilon, "algorithms.ccda.epsilon")?;
        validate_positive_usize(self.max_iterations, "algorithms.ccda.max_iterations")
    }
}

/// Agglomerative clustering (HAC) configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HacConfig {
    /// Only cluster pairs closer than this are merged
    pub distance_cutoff: f64,
}

impl Default for HacConfig {
    fn default() -> Self {
        Self {
            distance_cutoff: 1.0,
        }
    }
}

impl HacConfig {
    /// Validate HAC configuration
    pub fn validate(&self) -> Result<()> {
        if !self.distance_cutoff.is_finite() {
            return Err(MovewiseError::validation_field(
                "distance_cutoff must be finite",
                "algorithms.hac.distance_cutoff",
            ));
        }
        validate_positive_f64(self.distance_cutoff, "algorithms.hac.distance_cutoff")
    }
}

/// Contextual nearest-centroid (RMMR) configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RmmrConfig {
    /// Weight of the class-usage (Jaccard) distance
    pub conceptual_weight: f64,

    /// Weight of the TF-IDF cosine distance
    pub contextual_weight: f64,

    /// Accuracy multiplier for utility-like names
    pub utility_penalty: f64,

    /// Accuracy multiplier for factory or builder names
    pub factory_penalty: f64,

    /// Accuracy multiplier for methods named `main`
    pub main_penalty: f64,

    /// Minimum number of candidate classes
    pub min_candidates: usize,
}

impl Default for RmmrConfig {
    fn default() -> Self {
        Self {
            conceptual_weight: 0.55,
            contextual_weight: 0.45,
            utility_penalty: 0.5,
            factory_penalty: 0.6,
            main_penalty: 0.1,
            min_candidates: 2,
        }
    }
}

impl RmmrConfig {
    /// Validate RMMR configuration
    pub fn validate(&self) -> Result<()> {
        validate_unit_interval(self.conceptual_weight, "algorithms.rmmr.conceptual_weight")?;
        validate_unit_interval(self.contextual_weight, "algorithms.rmmr.contextual_weight")?;
        if ((self.conceptual_weight + self.contextual_weight) - 1.0).abs() > 1e-9 {
            return Err(MovewiseError::validation_field(
                format!(
                    "conceptual and contextual weights must sum to 1.0, got {}",
                    self.conceptual_weight + self.contextual_weight
                ),
                "algorithms.rmmr",
            ));
        }
        for (value, field) in [
            (self.utility_penalty, "algorithms.rmmr.utility_penalty"),
            (self.factory_penalty, "algorithms.rmmr.factory_penalty"),
            (self.main_penalty, "algorithms.rmmr.main_penalty"),
        ] {
            validate_positive_f64(value, field)?;
            validate_unit_interval(value, field)?;
        }
        validate_positive_usize(self.min_candidates, "algorithms.rmmr.min_candidates")
    }
}

/// Performance and resource configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Maximum number of worker threads; available parallelism when absent
    pub max_threads: Option<usize>,
}

impl PerformanceConfig {
    /// Validate performance configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(threads) = self.max_threads {
            validate_positive_usize(threads, "performance.max_threads")?;
        }
        Ok(())
    }
}

/// Output filtering configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Suggestions below this accuracy are dropped
    pub min_accuracy: f64,
}

impl OutputConfig {
    /// Validate output configuration
    pub fn validate(&self) -> Result<()> {
        validate_unit_interval(self.min_accuracy, "output.min_accuracy")
    }
}

fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(MovewiseError::validation_field(
            format!("{field} must be greater than 0"),
            field,
        ));
    }
    Ok(())
}

fn validate_positive_f64(value: f64, field: &str) -> Result<()> {
    if value.is_nan() || value <= 0.0 {
        return Err(MovewiseError::validation_field(
            format!("{field} must be greater than 0.0, got {value}"),
            field,
        ));
    }
    Ok(())
}

fn validate_unit_interval(value: f64, field: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(MovewiseError::validation_field(
            format!("{field} must be between 0.0 and 1.0, got {value}"),
            field,
        ));
    }
    Ok(())
}
