//! Refactoring search algorithms.
//!
//! Every algorithm consumes an [`EntityCorpus`] and an [`ExecutionContext`]
//! and produces move suggestions:
//!
//! - **ARI** / **MRI**: nearest-class assignment by raw distance ([`nearest_centroid`])
//! - **AKMeans**: complete-linkage partitional clustering ([`akmeans`])
//! - **CCDA**: greedy modularity optimization ([`ccda`])
//! - **HAC**: priority-queue agglomerative clustering ([`hac`])
//! - **RMMR**: nearest class under a conceptual + TF-IDF distance ([`rmmr`])
//!
//! The algorithms disagree by construction; callers compare or merge their
//! outputs rather than expecting one correct clustering.

pub mod akmeans;
pub mod ccda;
pub mod hac;
pub mod nearest_centroid;
pub mod rmmr;
mod voting;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::config::AlgorithmsConfig;
use crate::core::entity::EntityCorpus;
use crate::core::errors::{MovewiseError, Result};
use crate::core::execution::ExecutionContext;
use crate::core::results::Refactoring;

pub use akmeans::AkMeans;
pub use ccda::Ccda;
pub use hac::Hac;
pub use nearest_centroid::{Ari, Mri};
pub use rmmr::Rmmr;

/// A refactoring search strategy.
pub trait RefactoringAlgorithm: Send + Sync {
    /// Display name, also used as the context name
    fn name(&self) -> &'static str;

    /// Search the corpus for move suggestions.
    ///
    /// Implementations poll `ctx` for cancellation at least once per outer
    /// iteration and return [`MovewiseError::Cancelled`] unchanged.
    fn find_refactorings(
        &self,
        corpus: &EntityCorpus,
        ctx: &ExecutionContext,
    ) -> Result<Vec<Refactoring>>;
}

/// Selector for the built-in algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    /// Nearest class by raw distance
    Ari,
    /// Nearest class, applying each move before the next decision
    Mri,
    /// Partitional clustering with complete linkage
    AkMeans,
    /// Greedy modularity optimization
    Ccda,
    /// Agglomerative clustering
    Hac,
    /// Contextual nearest class
    Rmmr,
}

impl AlgorithmKind {
    /// Every built-in algorithm
    pub const ALL: [AlgorithmKind; 6] = [
        AlgorithmKind::Ari,
        AlgorithmKind::Mri,
        AlgorithmKind::AkMeans,
        AlgorithmKind::Ccda,
        AlgorithmKind::Hac,
        AlgorithmKind::Rmmr,
    ];

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmKind::Ari => "ARI",
            AlgorithmKind::Mri => "MRI",
            AlgorithmKind::AkMeans => "AKMeans",
            AlgorithmKind::Ccda => "CCDA",
            AlgorithmKind::Hac => "HAC",
            AlgorithmKind::Rmmr => "RMMR",
        }
    }

    /// One-line description
    pub fn description(self) -> &'static str {
        match self {
            AlgorithmKind::Ari => "assign each member to its nearest class",
            AlgorithmKind::Mri => "nearest class, replaying accepted moves on the class model",
            AlgorithmKind::AkMeans => "k-means style partitioning with complete-linkage distance",
            AlgorithmKind::Ccda => "greedy single-move modularity optimization",
            AlgorithmKind::Hac => "complete-linkage agglomerative clustering below a cutoff",
            AlgorithmKind::Rmmr => "nearest class by class usage and identifier TF-IDF",
        }
    }

    /// Instantiate the algorithm with its configuration section.
    pub fn build(self, config: &AlgorithmsConfig) -> Box<dyn RefactoringAlgorithm> {
        match self {
            AlgorithmKind::Ari => Box::new(Ari::new(config.nearest_centroid.clone())),
            AlgorithmKind::Mri => Box::new(Mri::new(config.nearest_centroid.clone())),
            AlgorithmKind::AkMeans => Box::new(AkMeans::new(config.akmeans.clone())),
            AlgorithmKind::Ccda => Box::new(Ccda::new(config.ccda.clone())),
            AlgorithmKind::Hac => Box::new(Hac::new(config.hac.clone())),
            AlgorithmKind::Rmmr => Box::new(Rmmr::new(config.rmmr.clone())),
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = MovewiseError;

    fn from_str(s: &str) -> Result<Self> {
        AlgorithmKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                MovewiseError::validation_field(
                    format!(
                        "unknown algorithm '{s}', expected one of: {}",
                        AlgorithmKind::ALL.map(AlgorithmKind::name).join(", ")
                    ),
                    "algorithm",
                )
            })
    }
}
