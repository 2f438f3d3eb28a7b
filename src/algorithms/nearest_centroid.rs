//! Nearest-class assignment (ARI) and its move-replaying variant (MRI).

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::algorithms::RefactoringAlgorithm;
use crate::core::config::NearestCentroidConfig;
use crate::core::entity::{Entity, EntityCorpus, EntityKind};
use crate::core::errors::Result;
use crate::core::execution::ExecutionContext;
use crate::core::properties::PropertyKind;
use crate::core::results::Refactoring;

/// Nearest candidate among a list of distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Index of the nearest candidate (lowest index on ties)
    pub index: usize,
    /// Distance to the nearest candidate
    pub distance: f64,
    /// Smallest positive gap to any other candidate; 0 when all tie, `+∞` when alone
    pub gap: f64,
    /// Number of candidates at finite distance
    pub candidates: usize,
}

impl Placement {
    /// Rank `distances`, ignoring non-finite entries. `None` without a finite candidate.
    pub fn rank(distances: &[f64]) -> Option<Self> {
        let mut best: Option<(usize, f64)> = None;
        let mut candidates = 0;
        for (index, &d) in distances.iter().enumerate() {
            if !d.is_finite() {
                continue;
            }
            candidates += 1;
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((index, d));
            }
        }
        let (index, distance) = best?;

        let gap = if candidates == 1 {
            f64::INFINITY
        } else {
            distances
                .iter()
                .filter(|d| d.is_finite())
                .map(|d| d - distance)
                .filter(|delta| *delta > 0.0)
                .fold(None, |min: Option<f64>, delta| Some(min.map_or(delta, |m| m.min(delta))))
                .unwrap_or(0.0)
        };

        Some(Self {
            index,
            distance,
            gap,
            candidates,
        })
    }

    /// Confidence in `[0, 1]`: grows with the gap and with closeness.
    pub fn accuracy(&self) -> f64 {
        margin_accuracy(self.gap, self.distance)
    }
}

/// Monotone blend of the runner-up gap and `1 - distance`.
pub(crate) fn margin_accuracy(gap: f64, distance: f64) -> f64 {
    let closeness = (1.0 - distance).clamp(0.0, 1.0);
    let separation = if gap.is_infinite() {
        1.0
    } else {
        gap.max(0.0) / (1.0 + gap.max(0.0))
    };
    0.5 * closeness + 0.5 * separation
}

/// Decide a placement against the candidate list, or why none is emitted.
///
/// `distances` holds one entry per class in the corpus; the candidate floor
/// counts classes, reachable or not.
pub(crate) fn decide(
    entity: &Entity,
    distances: &[f64],
    min_candidates: usize,
    algorithm: &str,
) -> Option<Placement> {
    if distances.len() < min_candidates {
        debug!(
            algorithm,
            entity = entity.name(),
            classes = distances.len(),
            "too few candidate classes, skipping"
        );
        return None;
    }
    let Some(placement) = Placement::rank(distances) else {
        warn!(
            algorithm,
            entity = entity.name(),
            "no class is structurally reachable, skipping"
        );
        return None;
    };
    Some(placement)
}

/// Assign Reachable Identity: every movable member goes to its nearest class.
#[derive(Debug, Clone, Default)]
pub struct Ari {
    config: NearestCentroidConfig,
}

impl Ari {
    /// Create ARI with the given configuration
    pub fn new(config: NearestCentroidConfig) -> Self {
        Self { config }
    }

    fn evaluate(&self, corpus: &EntityCorpus, entity: &Entity) -> Option<Refactoring> {
        if corpus.class(entity.class_name()).is_none() {
            warn!(
                algorithm = "ARI",
                entity = entity.name(),
                class = entity.class_name(),
                "containing class cannot be resolved, skipping"
            );
            return None;
        }

        let classes = corpus.classes();
        let distances: Vec<f64> = classes.iter().map(|c| corpus.distance(entity, c)).collect();
        let placement = decide(entity, &distances, self.config.min_candidates, "ARI")?;

        let target = &classes[placement.index];
        (target.name() != entity.class_name()).then(|| {
            Refactoring::new(entity.name(), target.name(), placement.accuracy(), entity.is_field())
        })
    }
}

impl RefactoringAlgorithm for Ari {
    fn name(&self) -> &'static str {
        "ARI"
    }

    fn find_refactorings(
        &self,
        corpus: &EntityCorpus,
        ctx: &ExecutionContext,
    ) -> Result<Vec<Refactoring>> {
        let started = Instant::now();
        let members: Vec<&Entity> = corpus.movable_members().collect();
        info!(
            members = members.len(),
            classes = corpus.classes().len(),
            "ARI started"
        );

        let refactorings = ctx.run_parallel(
            &members,
            Vec::new,
            |mut acc, entity| {
                acc.extend(self.evaluate(corpus, entity));
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
            "ARI finished"
        );
        Ok(refactorings)
    }
}

/// Move Reachable Identity: like ARI, but accepted moves are replayed on
/// private class copies so later decisions see them.
#[derive(Debug, Clone, Default)]
pub struct Mri {
    config: NearestCentroidConfig,
}

impl Mri {
    /// Create MRI with the given configuration
    pub fn new(config: NearestCentroidConfig) -> Self {
        Self { config }
    }
}

/// Which member map of a class holds `unit`.
fn member_kind(class: &Entity, unit: &Entity) -> PropertyKind {
    match unit.kind() {
        EntityKind::Field => PropertyKind::Field,
        _ if class
            .properties()
            .contains(PropertyKind::OverridingMethod, unit.name()) =>
        {
            PropertyKind::OverridingMethod
        }
        _ => PropertyKind::Method,
    }
}

/// Move `unit` from `source` to `target` on the private copies.
fn apply_move(source: &mut Entity, target: &mut Entity, unit: &mut Entity) {
    let kind = member_kind(source, unit);
    let member_weight = source
        .properties_mut()
        .remove(kind, unit.name())
        .unwrap_or(1);
    target
        .properties_mut()
        .add(kind, unit.name().to_string(), member_weight);

    let class_weight = unit
        .properties_mut()
        .remove(PropertyKind::Class, source.name())
        .unwrap_or(1);
    unit.properties_mut()
        .add(PropertyKind::Class, target.name().to_string(), class_weight);
    unit.set_class_name(target.name().to_string());
}

impl RefactoringAlgorithm for Mri {
    fn name(&self) -> &'static str {
        "MRI"
    }

    fn find_refactorings(
        &self,
        corpus: &EntityCorpus,
        ctx: &ExecutionContext,
    ) -> Result<Vec<Refactoring>> {
        let started = Instant::now();
        let mut classes: Vec<Entity> = corpus.classes().iter().map(Entity::copy).collect();
        let class_index: HashMap<String, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name().to_string(), i))
            .collect();

        let mut members: Vec<&Entity> = corpus.movable_members().collect();
        members.sort_by(|a, b| a.name().cmp(b.name()));
        info!(members = members.len(), classes = classes.len(), "MRI started");

        let total = members.len().max(1) as f64;
        let mut refactorings = Vec::new();
        for (step, member) in members.iter().enumerate() {
            ctx.check_cancelled()?;

            let Some(&source) = class_index.get(member.class_name()) else {
                warn!(
                    algorithm = "MRI",
                    entity = member.name(),
                    class = member.class_name(),
                    "containing class cannot be resolved, skipping"
                );
                continue;
            };

            let mut unit = member.copy();
            let distances =
                ctx.map_parallel(&classes, |class| Ok(corpus.distance(&unit, class)))?;
            let Some(placement) = decide(&unit, &distances, self.config.min_candidates, "MRI")
            else {
                ctx.report_progress((step + 1) as f64 / total);
                continue;
            };

            let target = placement.index;
            if target != source {
                refactorings.push(Refactoring::new(
                    unit.name(),
                    classes[target].name(),
                    placement.accuracy(),
                    unit.is_field(),
                ));
                debug!(
                    entity = unit.name(),
                    from = classes[source].name(),
                    to = classes[target].name(),
                    "MRI move applied"
                );

                let (low, high) = (source.min(target), source.max(target));
                let (head, tail) = classes.split_at_mut(high);
                let (from, to) = if source < target {
                    (&mut head[low], &mut tail[0])
                } else {
                    (&mut tail[0], &mut head[low])
                };
                apply_move(from, to, &mut unit);
            }
            ctx.report_progress((step + 1) as f64 / total);
        }

        info!(
            suggestions = refactorings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "MRI finished"
        );
        Ok(refactorings)
    }
}
