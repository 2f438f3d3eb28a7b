//! # Movewise-RS: Move-Method Refactoring Recommendation
//!
//! Models every class, method and field of a code corpus as an entity with a
//! feature vector and a weighted set of structural relations, then runs
//! competing clustering and assignment algorithms to decide which class each
//! member best belongs to:
//!
//! - **Nearest class**: ARI, MRI and the TF-IDF–weighted RMMR
//! - **Partitional clustering**: AKMeans with complete linkage
//! - **Modularity optimization**: CCDA, one greedy move per iteration
//! - **Agglomerative clustering**: HAC over a lazily invalidated merge queue
//!
//! Every algorithm runs on a shared rayon pool through an
//! [`ExecutionContext`](core::execution::ExecutionContext) that provides
//! cooperative cancellation, progress reporting and block-parallel folds.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    API Layer (engine)                │
//! ├──────────────────────────────────────────────────────┤
//! │  Algorithms                │  Core                   │
//! │ • ARI / MRI                │ • Entity / Corpus       │
//! │ • AKMeans                  │ • RelevantProperties    │
//! │ • CCDA                     │ • Distance metrics      │
//! │ • HAC                      │ • Execution harness     │
//! │ • RMMR                     │ • Config / Errors       │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use movewise_rs::{CancellationToken, EntityCorpus, MovewiseConfig, RefactoringEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let corpus: EntityCorpus = serde_json::from_str(&std::fs::read_to_string("corpus.json")?)?;
//!     let engine = RefactoringEngine::new(MovewiseConfig::default())?;
//!
//!     let results = engine.run_all(&corpus, &CancellationToken::new())?;
//!     for suggestion in RefactoringEngine::merge_suggestions(&results) {
//!         println!("{} -> {} ({:.2})", suggestion.unit(), suggestion.target(), suggestion.accuracy());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "mimalloc")]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

// Entity model, metrics and the execution harness
pub mod core {
    //! Entity model, distance metrics and shared infrastructure.

    pub mod config;
    pub mod distance;
    pub mod entity;
    pub mod errors;
    pub mod execution;
    pub mod properties;
    pub mod results;
}

// Refactoring search algorithms
pub mod algorithms;

// Public API and engine interface
pub mod api {
    //! High-level engine interface.

    pub mod engine;
}

// Re-export primary types for convenience
pub use algorithms::{AlgorithmKind, RefactoringAlgorithm};
pub use api::engine::RefactoringEngine;
pub use core::config::MovewiseConfig;
pub use core::entity::{Entity, EntityCorpus, EntityKind};
pub use core::errors::{MovewiseError, ResultExt, Result};
pub use core::execution::{CancellationToken, ExecutionContext, ProgressListener};
pub use core::properties::{PropertyKind, RelevantProperties};
pub use core::results::{AlgorithmResult, Refactoring, RunSummary};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
