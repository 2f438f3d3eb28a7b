//! Priority-queue agglomerative clustering (HAC).
//!
//! Every entity starts as a singleton cluster. Each pair closer than the
//! cutoff becomes a [`Triple`] in a min-heap ordered by distance, then by the
//! two cluster ids, which makes the merge order fully deterministic. Merging
//! invalidates every triple touching either cluster and re-links the new
//! cluster with complete linkage: a cluster `C` keeps a triple to `A ∪ B`
//! only if it had one to both `A` and `B`, at the larger of the two
//! distances.
//!
//! Heap entries are invalidated lazily: triples live in a slot arena with a
//! generation counter, and popped entries whose generation no longer matches
//! their slot are skipped.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};
use std::time::Instant;

use tracing::{debug, info};

use crate::algorithms::voting::cluster_suggestions;
use crate::algorithms::RefactoringAlgorithm;
use crate::core::config::HacConfig;
use crate::core::entity::{Entity, EntityCorpus};
use crate::core::errors::Result;
use crate::core::execution::ExecutionContext;
use crate::core::results::Refactoring;

/// Cluster identifier; singletons take the entity's position, merges take fresh ids
pub type ClusterId = usize;

/// Candidate merge of two clusters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triple {
    /// Complete-linkage distance between the clusters
    pub distance: f64,
    /// Lower cluster id
    pub first: ClusterId,
    /// Higher cluster id
    pub second: ClusterId,
}

impl Triple {
    fn new(distance: f64, a: ClusterId, b: ClusterId) -> Self {
        Self {
            distance,
            first: a.min(b),
            second: a.max(b),
        }
    }
}

/// Heap key: a triple plus the slot generation it was issued with.
#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    triple: Triple,
    slot: usize,
    generation: u64,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple
            .distance
            .total_cmp(&other.triple.distance)
            .then_with(|| self.triple.first.cmp(&other.triple.first))
            .then_with(|| self.triple.second.cmp(&other.triple.second))
    }
}

/// Pool statistics for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStatistics {
    /// Slots allocated fresh
    pub created_count: usize,
    /// Slots handed out again after release
    pub reused_count: usize,
    /// Slots currently live
    pub live_count: usize,
}

/// Slot arena for triples with a free list and per-slot generations.
#[derive(Debug, Default)]
struct TriplePool {
    slots: Vec<Triple>,
    generations: Vec<u64>,
    live: Vec<bool>,
    free: Vec<usize>,
    stats: PoolStatistics,
}

impl TriplePool {
    fn acquire(&mut self, triple: Triple) -> (usize, u64) {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = triple;
                self.stats.reused_count += 1;
                slot
            }
            None => {
                self.slots.push(triple);
                self.generations.push(0);
                self.live.push(false);
                self.stats.created_count += 1;
                self.slots.len() - 1
            }
        };
        self.live[slot] = true;
        self.stats.live_count += 1;
        (slot, self.generations[slot])
    }

    fn release(&mut self, slot: usize) {
        if !self.live[slot] {
            return;
        }
        self.live[slot] = false;
        self.generations[slot] += 1;
        self.free.push(slot);
        self.stats.live_count -= 1;
    }

    fn is_current(&self, entry: &HeapEntry) -> bool {
        self.live[entry.slot] && self.generations[entry.slot] == entry.generation
    }

    fn get(&self, slot: usize) -> Triple {
        self.slots[slot]
    }
}

/// One merge step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// Lower id of the merged pair
    pub first: ClusterId,
    /// Higher id of the merged pair
    pub second: ClusterId,
    /// Id given to the union
    pub merged: ClusterId,
    /// Distance the pair was merged at
    pub distance: f64,
}

/// Final clustering with its merge history.
#[derive(Debug)]
pub struct Dendrogram<'a> {
    /// Final clusters in ascending id order
    pub clusters: Vec<Vec<&'a Entity>>,
    /// Merges in the order they were applied
    pub merges: Vec<Merge>,
    /// Triple pool usage
    pub pool: PoolStatistics,
}

/// Cluster registry and merge queue, owned by the driving thread.
struct Agglomeration {
    members: BTreeMap<ClusterId, Vec<usize>>,
    links: BTreeMap<ClusterId, BTreeMap<ClusterId, usize>>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
    pool: TriplePool,
    next_id: ClusterId,
}

impl Agglomeration {
    fn new(points: usize) -> Self {
        Self {
            members: (0..points).map(|i| (i, vec![i])).collect(),
            links: BTreeMap::new(),
            heap: BinaryHeap::new(),
            pool: TriplePool::default(),
            next_id: points,
        }
    }

    fn link(&mut self, triple: Triple) {
        let (slot, generation) = self.pool.acquire(triple);
        self.links
            .entry(triple.first)
            .or_default()
            .insert(triple.second, slot);
        self.links
            .entry(triple.second)
            .or_default()
            .insert(triple.first, slot);
        self.heap.push(Reverse(HeapEntry {
            triple,
            slot,
            generation,
        }));
    }

    /// Pop the closest live pair.
    fn pop(&mut self) -> Option<Triple> {
        while let Some(Reverse(entry)) = self.heap.pop() {
            if self.pool.is_current(&entry) {
                return Some(entry.triple);
            }
        }
        None
    }

    /// Drop every triple touching `cluster` and return its neighbour distances.
    fn unlink(&mut self, cluster: ClusterId) -> BTreeMap<ClusterId, f64> {
        let neighbours = self.links.remove(&cluster).unwrap_or_default();
        let mut distances = BTreeMap::new();
        for (other, slot) in neighbours {
            distances.insert(other, self.pool.get(slot).distance);
            self.pool.release(slot);
            if let Some(back) = self.links.get_mut(&other) {
                back.remove(&cluster);
            }
        }
        distances
    }

    fn merge(&mut self, triple: Triple) -> Merge {
        let left = self.unlink(triple.first);
        let right = self.unlink(triple.second);

        let a = self.members.remove(&triple.first).unwrap_or_default();
        let b = self.members.remove(&triple.second).unwrap_or_default();
        let (mut larger, smaller) = if a.len() >= b.len() { (a, b) } else { (b, a) };
        larger.extend(smaller);

        let merged = self.next_id;
        self.next_id += 1;
        self.members.insert(merged, larger);

        for (&other, &d_left) in &left {
            if other == triple.second {
                continue;
            }
            if let Some(&d_right) = right.get(&other) {
                self.link(Triple::new(d_left.max(d_right), merged, other));
            }
        }

        Merge {
            first: triple.first,
            second: triple.second,
            merged,
            distance: triple.distance,
        }
    }
}

/// Complete-linkage agglomerative clustering below a distance cutoff.
#[derive(Debug, Clone, Default)]
pub struct Hac {
    config: HacConfig,
}

impl Hac {
    /// Create HAC with the given configuration
    pub fn new(config: HacConfig) -> Self {
        Self { config }
    }

    /// Cluster the corpus and keep the merge history.
    pub fn cluster<'a>(&self, corpus: &'a EntityCorpus, ctx: &ExecutionContext) -> Result<Dendrogram<'a>> {
        let points: Vec<&Entity> = corpus.clustering_entities().collect();
        let cutoff = self.config.distance_cutoff;

        let indices: Vec<usize> = (0..points.len()).collect();
        let triples = ctx.run_parallel(
            &indices,
            Vec::new,
            |mut acc, &i| {
                for j in (i + 1)..points.len() {
                    let d = corpus.distance(points[i], points[j]);
                    if d < cutoff {
                        acc.push(Triple::new(d, i, j));
                    }
                }
                Ok(acc)
            },
            |mut left, right| {
                left.extend(right);
                left
            },
        )?;
        debug!(candidates = triples.len(), "HAC initial triples");

        let mut state = Agglomeration::new(points.len());
        for triple in triples {
            state.link(triple);
        }

        let max_merges = points.len().saturating_sub(1).max(1) as f64;
        let mut merges = Vec::new();
        while let Some(triple) = state.pop() {
            ctx.check_cancelled()?;
            let merge = state.merge(triple);
            debug!(
                first = merge.first,
                second = merge.second,
                merged = merge.merged,
                distance = merge.distance,
                "HAC merge"
            );
            merges.push(merge);
            ctx.report_progress(merges.len() as f64 / max_merges);
        }
        ctx.report_progress(1.0);

        let clusters = state
            .members
            .values()
            .map(|members| members.iter().map(|&i| points[i]).collect())
            .collect();
        Ok(Dendrogram {
            clusters,
            merges,
            pool: state.pool.stats,
        })
    }
}

impl RefactoringAlgorithm for Hac {
    fn name(&self) -> &'static str {
        "HAC"
    }

    fn find_refactorings(
        &self,
        corpus: &EntityCorpus,
        ctx: &ExecutionContext,
    ) -> Result<Vec<Refactoring>> {
        let started = Instant::now();
        info!(
            entities = corpus.clustering_entities().count(),
            cutoff = self.config.distance_cutoff,
            "HAC started"
        );

        let dendrogram = self.cluster(corpus, ctx)?;
        let refactorings: Vec<Refactoring> = dendrogram
            .clusters
            .iter()
            .flat_map(|members| cluster_suggestions(corpus, members))
            .collect();

        info!(
            merges = dendrogram.merges.len(),
            clusters = dendrogram.clusters.len(),
            triples_created = dendrogram.pool.created_count,
            triples_reused = dendrogram.pool.reused_count,
            suggestions = refactorings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "HAC finished"
        );
        Ok(refactorings)
    }
}
