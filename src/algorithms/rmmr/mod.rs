//! Contextual nearest-class assignment (RMMR).
//!
//! The distance from a method to a class blends two sources:
//!
//! - **conceptual**: Jaccard distance between the classes the method uses
//!   and the classes each of the target's methods uses, averaged over
//!   those methods;
//! - **contextual**: `1 - cosine` between the method's identifier TF-IDF
//!   vector and the class document's vector.
//!
//! When a method is scored against its own class, the method is taken out
//! of that class first.

pub mod tfidf;

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::{info, warn};

use crate::algorithms::nearest_centroid::decide;
use crate::algorithms::RefactoringAlgorithm;
use crate::core::config::RmmrConfig;
use crate::core::distance::jaccard_distance;
use crate::core::entity::{Entity, EntityCorpus};
use crate::core::errors::Result;
use crate::core::execution::ExecutionContext;
use crate::core::results::Refactoring;

use tfidf::{cosine_similarity, term_counts, terms, TfIdfIndex};

/// Per-method data shared by every class comparison.
#[derive(Debug)]
struct MethodProfile<'a> {
    entity: &'a Entity,
    used_classes: HashSet<&'a str>,
    terms: HashMap<String, usize>,
}

impl<'a> MethodProfile<'a> {
    fn new(entity: &'a Entity) -> Self {
        Self {
            entity,
            used_classes: entity.properties().classes().collect(),
            terms: term_counts(&terms(entity.tokens())),
        }
    }
}

/// A class document: its own identifiers plus those of its methods.
#[derive(Debug)]
struct ClassProfile<'a> {
    entity: &'a Entity,
    methods: Vec<usize>,
    terms: HashMap<String, usize>,
}

/// Precomputed profiles and IDF table for one corpus.
#[derive(Debug)]
struct ContextModel<'a> {
    methods: Vec<MethodProfile<'a>>,
    classes: Vec<ClassProfile<'a>>,
    index: TfIdfIndex,
}

impl<'a> ContextModel<'a> {
    fn build(corpus: &'a EntityCorpus) -> Self {
        let methods: Vec<MethodProfile<'a>> = corpus.methods().iter().map(MethodProfile::new).collect();
        let class_index: HashMap<&str, usize> = corpus
            .classes()
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name(), i))
            .collect();

        let mut classes: Vec<ClassProfile<'a>> = corpus
            .classes()
            .iter()
            .map(|entity| ClassProfile {
                entity,
                methods: Vec::new(),
                terms: term_counts(&terms(entity.tokens())),
            })
            .collect();
        for (i, method) in methods.iter().enumerate() {
            if let Some(&c) = class_index.get(method.entity.class_name()) {
                let class = &mut classes[c];
                class.methods.push(i);
                for (term, count) in &method.terms {
                    *class.terms.entry(term.clone()).or_insert(0) += count;
                }
            }
        }

        let mut index = TfIdfIndex::new();
        for class in &classes {
            index.add_document(class.terms.keys());
        }

        Self {
            methods,
            classes,
            index,
        }
    }

    /// Blended distance from method `m` to class `c`.
    fn distance(&self, m: usize, c: usize, config: &RmmrConfig) -> f64 {
        let method = &self.methods[m];
        let class = &self.classes[c];
        let own = method.entity.class_name() == class.entity.name();

        let peers: Vec<&MethodProfile<'_>> = class
            .methods
            .iter()
            .filter(|&&peer| !(own && peer == m))
            .map(|&peer| &self.methods[peer])
            .collect();
        let conceptual = if peers.is_empty() {
            1.0
        } else {
            peers
                .iter()
                .map(|peer| jaccard_distance(&method.used_classes, &peer.used_classes))
                .sum::<f64>()
                / peers.len() as f64
        };

        let contextual = if own {
            let mut remaining = class.terms.clone();
            for (term, count) in &method.terms {
                if let Some(slot) = remaining.get_mut(term) {
                    *slot = slot.saturating_sub(*count);
                }
            }
            // terms only the method brought in leave the class document
            let vanished: HashSet<&str> = class
                .terms
                .iter()
                .filter(|(term, &count)| count > 0 && remaining.get(*term) == Some(&0))
                .map(|(term, _)| term.as_str())
                .collect();
            self.contextual(&method.terms, &remaining, &vanished)
        } else {
            self.contextual(&method.terms, &class.terms, &HashSet::new())
        };

        config.conceptual_weight * conceptual + config.contextual_weight * contextual
    }

    fn contextual(
        &self,
        method: &HashMap<String, usize>,
        class: &HashMap<String, usize>,
        vanished: &HashSet<&str>,
    ) -> f64 {
        let a = self.index.vector_excluding(method, vanished);
        let b = self.index.vector_excluding(class, vanished);
        if a.is_empty() || b.is_empty() {
            return 1.0;
        }
        1.0 - cosine_similarity(&a, &b)
    }
}

/// Accuracy multiplier from role-suggesting method names.
fn name_penalty(entity: &Entity, config: &RmmrConfig) -> f64 {
    let name = entity.simple_name().to_lowercase();
    let mut penalty = 1.0;
    if name.contains("util") || name.contains("helper") {
        penalty *= config.utility_penalty;
    }
    if name.contains("factory") || name.contains("builder") {
        penalty *= config.factory_penalty;
    }
    if name == "main" {
        penalty *= config.main_penalty;
    }
    penalty
}

/// Nearest class under the conceptual + contextual distance.
#[derive(Debug, Clone, Default)]
pub struct Rmmr {
    config: RmmrConfig,
}

impl Rmmr {
    /// Create RMMR with the given configuration
    pub fn new(config: RmmrConfig) -> Self {
        Self { config }
    }

    fn evaluate(&self, model: &ContextModel<'_>, m: usize) -> Option<Refactoring> {
        let method = model.methods[m].entity;
        if !model
            .classes
            .iter()
            .any(|c| c.entity.name() == method.class_name())
        {
            warn!(
                algorithm = "RMMR",
                entity = method.name(),
                class = method.class_name(),
                "containing class cannot be resolved, skipping"
            );
            return None;
        }

        let distances: Vec<f64> = (0..model.classes.len())
            .map(|c| model.distance(m, c, &self.config))
            .collect();
        let placement = decide(method, &distances, self.config.min_candidates, "RMMR")?;

        let target = model.classes[placement.index].entity;
        if target.name() == method.class_name() {
            return None;
        }
        let accuracy = placement.accuracy() * name_penalty(method, &self.config);
        Some(Refactoring::new(method.name(), target.name(), accuracy, false))
    }
}

impl RefactoringAlgorithm for Rmmr {
    fn name(&self) -> &'static str {
        "RMMR"
    }

    fn find_refactorings(
        &self,
        corpus: &EntityCorpus,
        ctx: &ExecutionContext,
    ) -> Result<Vec<Refactoring>> {
        let started = Instant::now();
        let model = ContextModel::build(corpus);
        let candidates: Vec<usize> = (0..model.methods.len())
            .filter(|&m| model.methods[m].entity.is_movable())
            .collect();
        info!(
            methods = candidates.len(),
            classes = model.classes.len(),
            documents = model.index.total_documents(),
            "RMMR started"
        );

        let refactorings = ctx.run_parallel(
            &candidates,
            Vec::new,
            |mut acc, &m| {
                acc.extend(self.evaluate(&model, m));
                Ok(acc)
            },
            |mut left, right| {
                left.extend(right);
                left
            },
        )?;
        ctx.report_progress(1.0);

        info!(
            suggestions = refactorings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "RMMR finished"
        );
        Ok(refactorings)
    }
}
