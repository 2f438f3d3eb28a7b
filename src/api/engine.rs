//! Main refactoring engine implementation.

use std::sync::Arc;
use std::time::Instant;

use rayon::ThreadPool;
use tracing::{error, info};

use crate::algorithms::{AlgorithmKind, RefactoringAlgorithm};
use crate::core::config::MovewiseConfig;
use crate::core::entity::EntityCorpus;
use crate::core::errors::Result;
use crate::core::execution::{CancellationToken, ExecutionContext, ProgressListener};
use crate::core::results::{merge_refactorings, sort_refactorings, AlgorithmResult, Refactoring};

/// Main movewise refactoring engine
pub struct RefactoringEngine {
    /// Engine configuration
    config: Arc<MovewiseConfig>,

    /// Worker pool shared by every run
    pool: Arc<ThreadPool>,

    /// Forwarded to every execution context
    listener: Option<Arc<dyn ProgressListener>>,
}

impl RefactoringEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: MovewiseConfig) -> Result<Self> {
        info!("Initializing movewise refactoring engine");
        config.validate()?;

        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("movewise-worker-{i}"));
        if let Some(threads) = config.performance.max_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;

        info!(threads = pool.current_num_threads(), "Movewise engine initialized");
        Ok(Self {
            config: Arc::new(config),
            pool: Arc::new(pool),
            listener: None,
        })
    }

    /// Forward progress of every run to `listener`
    pub fn with_progress_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Get the current configuration
    pub fn config(&self) -> &MovewiseConfig {
        &self.config
    }

    /// Worker threads in the pool
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run one built-in algorithm.
    pub fn run(
        &self,
        kind: AlgorithmKind,
        corpus: &EntityCorpus,
        token: &CancellationToken,
    ) -> Result<AlgorithmResult> {
        let algorithm = kind.build(&self.config.algorithms);
        self.run_algorithm(algorithm.as_ref(), corpus, token)
    }

    /// Run any algorithm on the engine's pool.
    ///
    /// Cancellation is returned as `Err`; every other failure is logged and
    /// captured in a failed [`AlgorithmResult`].
    pub fn run_algorithm(
        &self,
        algorithm: &dyn RefactoringAlgorithm,
        corpus: &EntityCorpus,
        token: &CancellationToken,
    ) -> Result<AlgorithmResult> {
        let name = algorithm.name();
        let mut ctx = ExecutionContext::new(name, Arc::clone(&self.pool), token.clone());
        if let Some(listener) = &self.listener {
            ctx = ctx.with_progress_listener(Arc::clone(listener));
        }

        let started = Instant::now();
        let outcome = algorithm.find_refactorings(corpus, &ctx);
        let elapsed = started.elapsed();

        match outcome {
            Ok(mut refactorings) => {
                let min_accuracy = self.config.output.min_accuracy;
                refactorings.retain(|r| r.accuracy() >= min_accuracy);
                sort_refactorings(&mut refactorings);
                info!(
                    algorithm = name,
                    suggestions = refactorings.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Algorithm completed"
                );
                Ok(AlgorithmResult::success(name, refactorings, elapsed, ctx.threads()))
            }
            Err(err) if err.is_cancelled() => {
                info!(algorithm = name, "Algorithm cancelled");
                Err(err)
            }
            Err(err) => {
                error!(algorithm = name, error = %err, "Algorithm failed");
                Ok(AlgorithmResult::failure(name, err, elapsed, ctx.threads()))
            }
        }
    }

    /// Run every enabled algorithm in configuration order.
    ///
    /// A failing algorithm does not stop the others; cancellation stops all.
    pub fn run_all(
        &self,
        corpus: &EntityCorpus,
        token: &CancellationToken,
    ) -> Result<Vec<AlgorithmResult>> {
        info!(
            algorithms = self.config.algorithms.enabled.len(),
            entities = corpus.len(),
            "Starting refactoring search"
        );
        self.config
            .algorithms
            .enabled
            .iter()
            .map(|&kind| self.run(kind, corpus, token))
            .collect()
    }

    /// Deduplicate suggestions across runs, keeping the most accurate.
    pub fn merge_suggestions(results: &[AlgorithmResult]) -> Vec<Refactoring> {
        merge_refactorings(results.iter().flat_map(|r| r.refactorings()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PerformanceConfig;
    use crate::core::entity::Entity;
    use crate::core::errors::MovewiseError;
    use crate::core::properties::PropertyKind;
    use std::time::Duration;

    struct Failing;

    impl RefactoringAlgorithm for Failing {
        fn name(&self) -> &'static str {
            "Failing"
        }

        fn find_refactorings(
            &self,
            _corpus: &EntityCorpus,
            _ctx: &ExecutionContext,
        ) -> Result<Vec<Refactoring>> {
            Err(MovewiseError::algorithm("Failing", "no luck"))
        }
    }

    fn engine() -> RefactoringEngine {
        RefactoringEngine::new(MovewiseConfig {
            performance: PerformanceConfig {
                max_threads: Some(2),
            },
            ..MovewiseConfig::default()
        })
        .unwrap()
    }

    fn corpus() -> EntityCorpus {
        let a = |e: Entity| {
            e.with_relation(PropertyKind::Class, "A", 1)
                .with_relation(PropertyKind::Method, "A.g", 1)
                .with_relation(PropertyKind::Field, "A.f", 1)
        };
        EntityCorpus::new(
            vec![
                a(Entity::class("A")),
                Entity::class("B")
                    .with_relation(PropertyKind::Class, "B", 1)
                    .with_relation(PropertyKind::Method, "B.m", 1),
            ],
            vec![
                a(Entity::method("A.g", "A")),
                a(Entity::method("B.m", "B"))
                    .with_relation(PropertyKind::Class, "B", 1)
                    .with_relation(PropertyKind::Method, "B.m", 1),
            ],
            vec![],
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_engine_uses_configured_threads() {
        assert_eq!(engine().threads(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = MovewiseConfig::default();
        config.algorithms.enabled.clear();
        assert!(RefactoringEngine::new(config).is_err());
    }

    #[test]
    fn test_failure_is_captured() {
        let result = engine()
            .run_algorithm(&Failing, &corpus(), &CancellationToken::new())
            .unwrap();
        assert!(!result.is_success());
        assert!(result.refactorings().is_empty());
        assert_eq!(result.algorithm(), "Failing");
    }

    #[test]
    fn test_cancellation_is_raised() {
        let token = CancellationToken::new();
        token.cancel();
        let err = engine().run(AlgorithmKind::Ari, &corpus(), &token).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_min_accuracy_filter() {
        let mut config = MovewiseConfig::default();
        config.output.min_accuracy = 1.0;
        let engine = RefactoringEngine::new(config).unwrap();
        let result = engine
            .run(AlgorithmKind::Ari, &corpus(), &CancellationToken::new())
            .unwrap();
        assert!(result.is_success());
        assert!(result.refactorings().is_empty());
    }

    #[test]
    fn test_run_all_and_merge() {
        let results = engine().run_all(&corpus(), &CancellationToken::new()).unwrap();
        assert_eq!(results.len(), MovewiseConfig::default().algorithms.enabled.len());
        assert!(results.iter().all(AlgorithmResult::is_success));

        let merged = RefactoringEngine::merge_suggestions(&results);
        let mut seen = std::collections::HashSet::new();
        assert!(merged.iter().all(|r| seen.insert((r.unit(), r.target()))));
        assert!(merged.iter().any(|r| r.unit() == "B.m" && r.target() == "A"));
    }

    #[test]
    fn test_merge_prefers_higher_accuracy() {
        let results = vec![
            AlgorithmResult::success(
                "ARI",
                vec![Refactoring::new("B.m", "A", 0.4, false)],
                Duration::ZERO,
                1,
            ),
            AlgorithmResult::success(
                "HAC",
                vec![Refactoring::new("B.m", "A", 0.9, false)],
                Duration::ZERO,
                1,
            ),
        ];
        let merged = RefactoringEngine::merge_suggestions(&results);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].accuracy(), 0.9);
    }
}
