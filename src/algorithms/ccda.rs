//! Greedy modularity optimization over the relation graph (CCDA).
//!
//! Nodes are the clustering entities, edges the structural relations between
//! them. Communities start as one per class. Every outer iteration evaluates,
//! in parallel, the best neighbouring community for every movable node using
//! the closed-form Louvain delta
//!
//! ```text
//! ΔQ = (k_iB - k_iA) / m - k_i (tot_B - tot_A + k_i) / 2m²
//! ```
//!
//! and applies only the single best move found over the whole graph. The
//! loop stops once the best delta no longer exceeds epsilon.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use tracing::{debug, info, warn};

use crate::algorithms::RefactoringAlgorithm;
use crate::core::config::CcdaConfig;
use crate::core::entity::{Entity, EntityCorpus};
use crate::core::errors::Result;
use crate::core::execution::ExecutionContext;
use crate::core::results::Refactoring;

/// Community identifier; communities are indexed like the corpus classes
pub type CommunityId = usize;

/// A candidate single-node move.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Move {
    node: usize,
    community: CommunityId,
    delta: f64,
}

impl Move {
    /// Larger delta wins; ties go to the lower node, then the lower community.
    fn better(self, other: Move) -> Move {
        match self.delta.total_cmp(&other.delta) {
            std::cmp::Ordering::Greater => self,
            std::cmp::Ordering::Less => other,
            std::cmp::Ordering::Equal => {
                if (self.node, self.community) <= (other.node, other.community) {
                    self
                } else {
                    other
                }
            }
        }
    }
}

fn pick(a: Option<Move>, b: Option<Move>) -> Option<Move> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.better(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Relation graph with its community assignment and degree coefficients.
#[derive(Debug)]
pub struct CommunityGraph<'a> {
    graph: UnGraph<&'a Entity, f64>,
    community: Vec<CommunityId>,
    home: Vec<CommunityId>,
    degree: Vec<f64>,
    total_degree: Vec<f64>,
    total_weight: f64,
}

impl<'a> CommunityGraph<'a> {
    /// Build the graph for `corpus`, one community per class.
    ///
    /// Entities whose containing class is not in the corpus are left out.
    pub fn build(corpus: &'a EntityCorpus) -> Self {
        let class_index: HashMap<&str, CommunityId> = corpus
            .classes()
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name(), i))
            .collect();

        let mut graph = UnGraph::<&Entity, f64>::default();
        let mut community = Vec::new();
        let mut by_name: HashMap<&str, NodeIndex> = HashMap::new();
        for entity in corpus.clustering_entities() {
            let Some(&home) = class_index.get(entity.class_name()) else {
                warn!(
                    algorithm = "CCDA",
                    entity = entity.name(),
                    class = entity.class_name(),
                    "containing class cannot be resolved, leaving entity out of the graph"
                );
                continue;
            };
            by_name.insert(entity.name(), graph.add_node(entity));
            community.push(home);
        }

        let mut edges: BTreeMap<(NodeIndex, NodeIndex), u32> = BTreeMap::new();
        for node in graph.node_indices() {
            for (_, name, weight) in graph[node].properties().iter() {
                let Some(&other) = by_name.get(name) else {
                    continue;
                };
                if other == node {
                    continue;
                }
                let key = (node.min(other), node.max(other));
                let slot = edges.entry(key).or_insert(weight);
                *slot = (*slot).max(weight);
            }
        }
        for ((a, b), weight) in edges {
            graph.add_edge(a, b, f64::from(weight));
        }

        let degree: Vec<f64> = graph
            .node_indices()
            .map(|n| graph.edges(n).map(|e| *e.weight()).sum::<f64>())
            .collect();
        let mut total_degree = vec![0.0; corpus.classes().len()];
        for (node, &c) in community.iter().enumerate() {
            total_degree[c] += degree[node];
        }
        let total_weight: f64 = graph.edge_weights().sum();

        Self {
            graph,
            home: community.clone(),
            community,
            degree,
            total_degree,
            total_weight,
        }
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Total edge weight `m`
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Entity at `node`
    pub fn entity(&self, node: usize) -> &'a Entity {
        self.graph[NodeIndex::new(node)]
    }

    /// Current community of `node`
    pub fn community_of(&self, node: usize) -> CommunityId {
        self.community[node]
    }

    /// Edge weight from `node` into each neighbouring community.
    fn links(&self, node: usize) -> BTreeMap<CommunityId, f64> {
        let index = NodeIndex::new(node);
        let mut links = BTreeMap::new();
        for edge in self.graph.edges(index) {
            let other = if edge.source() == index {
                edge.target()
            } else {
                edge.source()
            };
            *links.entry(self.community[other.index()]).or_insert(0.0) += *edge.weight();
        }
        links
    }

    /// Modularity delta of moving `node` into `target`.
    fn delta(&self, node: usize, target: CommunityId, links: &BTreeMap<CommunityId, f64>) -> f64 {
        let source = self.community[node];
        let m = self.total_weight;
        let k_i = self.degree[node];
        let k_target = links.get(&target).copied().unwrap_or(0.0);
        let k_source = links.get(&source).copied().unwrap_or(0.0);
        (k_target - k_source) / m
            - k_i * (self.total_degree[target] - self.total_degree[source] + k_i) / (2.0 * m * m)
    }

    /// Best move for `node` among its neighbouring communities.
    fn best_move(&self, node: usize) -> Option<Move> {
        let current = self.community[node];
        let links = self.links(node);
        links
            .keys()
            .filter(|&&c| c != current)
            .map(|&community| Move {
                node,
                community,
                delta: self.delta(node, community, &links),
            })
            .reduce(Move::better)
    }

    /// Move `node` and update the degree coefficients.
    fn apply(&mut self, node: usize, target: CommunityId) {
        let source = self.community[node];
        self.total_degree[source] -= self.degree[node];
        self.total_degree[target] += self.degree[node];
        self.community[node] = target;
    }

    /// Share of `node`'s edge weight landing in its current community.
    fn cohesion(&self, node: usize) -> f64 {
        if self.degree[node] == 0.0 {
            return 0.0;
        }
        let own = self.community[node];
        self.links(node).get(&own).copied().unwrap_or(0.0) / self.degree[node]
    }

    /// Newman modularity of the current assignment.
    pub fn modularity(&self) -> f64 {
        let m = self.total_weight;
        if m == 0.0 {
            return 0.0;
        }
        let mut internal = vec![0.0; self.total_degree.len()];
        for edge in self.graph.edge_references() {
            let a = self.community[edge.source().index()];
            if a == self.community[edge.target().index()] {
                internal[a] += *edge.weight();
            }
        }
        internal
            .iter()
            .zip(&self.total_degree)
            .map(|(l, tot)| l / m - (tot / (2.0 * m)).powi(2))
            .sum()
    }
}

/// Result of one modularity optimization.
#[derive(Debug, Clone)]
pub struct ModularityOutcome {
    /// Suggestions still standing at the end of the run
    pub refactorings: Vec<Refactoring>,
    /// Accepted moves
    pub moves: usize,
    /// Modularity before the first move and after every accepted move,
    /// recomputed from the assignment
    pub modularity_history: Vec<f64>,
    /// Predicted delta of every accepted move
    pub deltas: Vec<f64>,
}

/// Greedy single-move modularity optimizer.
#[derive(Debug, Clone, Default)]
pub struct Ccda {
    config: CcdaConfig,
}

impl Ccda {
    /// Create CCDA with the given configuration
    pub fn new(config: CcdaConfig) -> Self {
        Self { config }
    }

    /// Run the optimizer and keep its modularity trace.
    pub fn optimize(&self, corpus: &EntityCorpus, ctx: &ExecutionContext) -> Result<ModularityOutcome> {
        let mut graph = CommunityGraph::build(corpus);
        let mut history = vec![graph.modularity()];
        if graph.total_weight() == 0.0 {
            info!("CCDA: relation graph has no edges, nothing to optimize");
            return Ok(ModularityOutcome {
                refactorings: Vec::new(),
                moves: 0,
                modularity_history: history,
                deltas: Vec::new(),
            });
        }

        let candidates: Vec<usize> = (0..graph.node_count())
            .filter(|&n| graph.entity(n).is_movable())
            .collect();
        let epsilon = self.config.epsilon;

        let mut suggestions: BTreeMap<usize, (CommunityId, f64)> = BTreeMap::new();
        let mut deltas = Vec::new();
        let mut progress = 0.0f64;
        let mut moves = 0;
        while moves < self.config.max_iterations {
            ctx.check_cancelled()?;

            let best = ctx.run_parallel(
                &candidates,
                || None,
                |best, &node| Ok(pick(best, graph.best_move(node))),
                pick,
            )?;
            let Some(best) = best.filter(|m| m.delta > epsilon) else {
                break;
            };

            graph.apply(best.node, best.community);
            moves += 1;
            let quality = graph.modularity();
            history.push(quality);
            deltas.push(best.delta);

            if best.community == graph.home[best.node] {
                suggestions.remove(&best.node);
            } else {
                suggestions.insert(best.node, (best.community, graph.cohesion(best.node)));
            }
            debug!(
                entity = graph.entity(best.node).name(),
                community = best.community,
                delta = best.delta,
                modularity = quality,
                "CCDA move applied"
            );

            progress = progress.max((epsilon / best.delta).min(1.0));
            ctx.report_progress(progress);
        }
        if moves == self.config.max_iterations {
            warn!(max_iterations = moves, "CCDA stopped at the iteration limit");
        }
        ctx.report_progress(1.0);

        let classes = corpus.classes();
        let refactorings = suggestions
            .into_iter()
            .map(|(node, (community, accuracy))| {
                let entity = graph.entity(node);
                Refactoring::new(entity.name(), classes[community].name(), accuracy, entity.is_field())
            })
            .collect();

        Ok(ModularityOutcome {
            refactorings,
            moves,
            modularity_history: history,
            deltas,
        })
    }
}

impl RefactoringAlgorithm for Ccda {
    fn name(&self) -> &'static str {
        "CCDA"
    }

    fn find_refactorings(
        &self,
        corpus: &EntityCorpus,
        ctx: &ExecutionContext,
    ) -> Result<Vec<Refactoring>> {
        let started = Instant::now();
        info!(
            entities = corpus.clustering_entities().count(),
            communities = corpus.classes().len(),
            epsilon = self.config.epsilon,
            "CCDA started"
        );

        let outcome = self.optimize(corpus, ctx)?;

        info!(
            moves = outcome.moves,
            modularity = outcome.modularity_history.last().copied().unwrap_or_default(),
            suggestions = outcome.refactorings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "CCDA finished"
        );
        Ok(outcome.refactorings)
    }
}
