//! Partitional clustering with complete-linkage reassignment (AKMeans).
//!
//! One cluster is seeded per class from a randomly chosen member of that
//! class. Each step scans every point in parallel, measures its
//! complete-linkage distance (maximum distance to any other member) to every
//! cluster, and proposes a reassignment when another cluster is strictly
//! closer. Proposals are applied together once the scan has returned.

use std::time::Instant;

use rand::prelude::*;
use tracing::{debug, info};

use crate::algorithms::voting::cluster_suggestions;
use crate::algorithms::RefactoringAlgorithm;
use crate::core::config::AkMeansConfig;
use crate::core::entity::{Entity, EntityCorpus};
use crate::core::errors::{MovewiseError, Result};
use crate::core::execution::ExecutionContext;
use crate::core::results::Refactoring;

/// Lifecycle of a [`Partition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusteringState {
    /// No seeds chosen yet
    Uninitialized,
    /// One seed per class, no step taken
    CentersInitialized,
    /// At least one step moved a point
    Iterating,
    /// The last step moved nothing
    Converged,
}

/// Point-to-cluster assignment over the clustering entities of a corpus.
#[derive(Debug)]
pub struct Partition<'a> {
    points: Vec<&'a Entity>,
    assignment: Vec<Option<usize>>,
    clusters: Vec<Vec<usize>>,
    state: ClusteringState,
    steps: usize,
}

impl<'a> Partition<'a> {
    /// Unseeded partition over `points`
    pub fn new(points: Vec<&'a Entity>) -> Self {
        let assignment = vec![None; points.len()];
        Self {
            points,
            assignment,
            clusters: Vec::new(),
            state: ClusteringState::Uninitialized,
            steps: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> ClusteringState {
        self.state
    }

    /// Steps taken so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Seed one cluster per class with a random member of that class.
    ///
    /// A class without any point of its own is left without a cluster.
    pub fn initialize<R: Rng + ?Sized>(&mut self, classes: &[Entity], rng: &mut R) -> Result<()> {
        if self.state != ClusteringState::Uninitialized {
            return Err(MovewiseError::internal("partition is already seeded"));
        }

        for class in classes {
            let mut candidates: Vec<usize> = self
                .points
                .iter()
                .enumerate()
                .filter(|(_, p)| p.class_name() == class.name())
                .map(|(i, _)| i)
                .collect();
            candidates.shuffle(rng);
            if let Some(&seed) = candidates.first() {
                self.assignment[seed] = Some(self.clusters.len());
                self.clusters.push(vec![seed]);
            }
        }

        self.state = ClusteringState::CentersInitialized;
        Ok(())
    }

    /// Complete-linkage distance from `point` to `cluster`, excluding the point itself.
    ///
    /// A point alone in its own cluster is at distance 0 from it.
    fn linkage(&self, corpus: &EntityCorpus, point: usize, cluster: usize) -> f64 {
        let entity = self.points[point];
        self.clusters[cluster]
            .iter()
            .filter(|&&member| member != point)
            .map(|&member| corpus.distance(entity, self.points[member]))
            .fold(None, |max: Option<f64>, d| Some(max.map_or(d, |m| m.max(d))))
            .unwrap_or(if self.assignment[point] == Some(cluster) {
                0.0
            } else {
                f64::INFINITY
            })
    }

    /// Cluster `point` should move to, if any is strictly closer than its own.
    fn proposal(&self, corpus: &EntityCorpus, point: usize) -> Option<usize> {
        let current = self.assignment[point];
        let current_distance = current.map_or(f64::INFINITY, |c| self.linkage(corpus, point, c));

        let mut best: Option<(usize, f64)> = None;
        for cluster in 0..self.clusters.len() {
            if Some(cluster) == current || self.clusters[cluster].is_empty() {
                continue;
            }
            let d = self.linkage(corpus, point, cluster);
            if d.is_finite() && best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((cluster, d));
            }
        }

        best.filter(|&(_, d)| d < current_distance)
            .map(|(cluster, _)| cluster)
    }

    /// Scan every point in parallel and apply all reassignments together.
    ///
    /// Returns the number of points that moved.
    pub fn step(&mut self, corpus: &EntityCorpus, ctx: &ExecutionContext) -> Result<usize> {
        match self.state {
            ClusteringState::CentersInitialized | ClusteringState::Iterating => {}
            ClusteringState::Uninitialized => {
                return Err(MovewiseError::internal("partition stepped before seeding"))
            }
            ClusteringState::Converged => return Ok(0),
        }

        let indices: Vec<usize> = (0..self.points.len()).collect();
        let proposals = ctx.map_parallel(&indices, |&point| Ok(self.proposal(corpus, point)))?;

        let mut moved = 0;
        for (point, target) in proposals.into_iter().enumerate() {
            let Some(target) = target else {
                continue;
            };
            if let Some(source) = self.assignment[point] {
                self.clusters[source].retain(|&member| member != point);
            }
            self.clusters[target].push(point);
            self.assignment[point] = Some(target);
            moved += 1;
        }

        self.steps += 1;
        self.state = if moved == 0 {
            ClusteringState::Converged
        } else {
            ClusteringState::Iterating
        };
        Ok(moved)
    }

    /// Step until convergence or `max_steps`.
    pub fn run(&mut self, corpus: &EntityCorpus, ctx: &ExecutionContext, max_steps: usize) -> Result<()> {
        while self.state != ClusteringState::Converged && self.steps < max_steps {
            ctx.check_cancelled()?;
            let moved = self.step(corpus, ctx)?;
            debug!(step = self.steps, moved, "AKMeans step");
            ctx.report_progress(self.steps as f64 / max_steps as f64);
        }
        Ok(())
    }

    /// Non-empty clusters as member lists
    pub fn clusters(&self) -> impl Iterator<Item = Vec<&'a Entity>> + '_ {
        self.clusters
            .iter()
            .filter(|members| !members.is_empty())
            .map(|members| members.iter().map(|&i| self.points[i]).collect())
    }
}

/// Complete-linkage k-means over classes, methods and (optionally) fields.
#[derive(Debug, Clone, Default)]
pub struct AkMeans {
    config: AkMeansConfig,
}

impl AkMeans {
    /// Create AKMeans with the given configuration
    pub fn new(config: AkMeansConfig) -> Self {
        Self { config }
    }

    /// Seed and run a partition without deriving suggestions.
    pub fn partition<'a>(
        &self,
        corpus: &'a EntityCorpus,
        ctx: &ExecutionContext,
    ) -> Result<Partition<'a>> {
        let mut rng: Box<dyn RngCore> = match self.config.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(rand::rng()),
        };

        let mut partition = Partition::new(corpus.clustering_entities().collect());
        partition.initialize(corpus.classes(), &mut rng)?;
        partition.run(corpus, ctx, self.config.max_steps)?;
        Ok(partition)
    }
}

impl RefactoringAlgorithm for AkMeans {
    fn name(&self) -> &'static str {
        "AKMeans"
    }

    fn find_refactorings(
        &self,
        corpus: &EntityCorpus,
        ctx: &ExecutionContext,
    ) -> Result<Vec<Refactoring>> {
        let started = Instant::now();
        info!(
            points = corpus.clustering_entities().count(),
            clusters = corpus.classes().len(),
            max_steps = self.config.max_steps,
            "AKMeans started"
        );

        let partition = self.partition(corpus, ctx)?;
        let refactorings: Vec<Refactoring> = partition
            .clusters()
            .flat_map(|members| cluster_suggestions(corpus, &members))
            .collect();
        ctx.report_progress(1.0);

        info!(
            steps = partition.steps(),
            converged = partition.state() == ClusteringState::Converged,
            suggestions = refactorings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "AKMeans finished"
        );
        Ok(refactorings)
    }
}
