//! Entity distance metrics.
//!
//! The structural metric combines a feature-vector term with the weighted
//! Jaccard distance of two relation sets:
//!
//! ```text
//! d(a, b) = sqrt( f(va, vb, same_kind) + (1 - |Pa ∩ Pb| / |Pa ∪ Pb|) )
//! ```
//!
//! and is `+∞` whenever the weighted intersection is empty, so entities that
//! share no relation are never paired by any algorithm.

use std::collections::HashSet;
use std::hash::Hash;

use crate::core::entity::Entity;
use crate::core::properties::RelevantProperties;

/// Pluggable distance between two entities.
///
/// Implementations must be symmetric.
pub trait DistanceMetric: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Distance between `a` and `b`; `f64::INFINITY` marks an unrelated pair
    fn distance(&self, a: &Entity, b: &Entity) -> f64;
}

/// Category-sensitive structural distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralDistance;

impl DistanceMetric for StructuralDistance {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn distance(&self, a: &Entity, b: &Entity) -> f64 {
        let Some(relation) = relation_distance(a.properties(), b.properties()) else {
            return f64::INFINITY;
        };
        let vector = feature_term(a.features(), b.features(), a.kind() == b.kind());
        (vector + relation).sqrt()
    }
}

/// `1 - |P1 ∩ P2| / |P1 ∪ P2|` with min-combined intersection weights, or
/// `None` when the intersection is empty.
pub fn relation_distance(a: &RelevantProperties, b: &RelevantProperties) -> Option<f64> {
    let intersection = a.size_of_intersection(b, u32::min);
    if intersection == 0 {
        return None;
    }
    let union = a.size_of_union(b);
    // union >= intersection >= 1
    Some(1.0 - intersection as f64 / union as f64)
}

/// Feature-vector contribution normalised by `1 / (w + 1)`.
///
/// Vectors of equal category contribute their squared difference; vectors of
/// different categories live in different spaces and contribute their squared
/// magnitudes independently. Missing trailing components count as zero.
pub fn feature_term(a: &[f64], b: &[f64], same_kind: bool) -> f64 {
    let width = a.len().max(b.len());
    let raw: f64 = if same_kind {
        (0..width)
            .map(|i| {
                let d = a.get(i).copied().unwrap_or(0.0) - b.get(i).copied().unwrap_or(0.0);
                d * d
            })
            .sum()
    } else {
        a.iter().map(|x| x * x).sum::<f64>() + b.iter().map(|y| y * y).sum::<f64>()
    };
    raw / (width as f64 + 1.0)
}

/// Jaccard distance of two plain sets; 1.0 when both are empty.
pub fn jaccard_distance<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    1.0 - intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::properties::PropertyKind;
    use approx::assert_relative_eq;

    fn method(name: &str, relations: &[(PropertyKind, &str)]) -> Entity {
        let mut entity = Entity::method(name, "A");
        for &(kind, related) in relations {
            entity = entity.with_relation(kind, related, 1);
        }
        entity
    }

    #[test]
    fn test_identical_relations_zero_distance() {
        let a = method("A.x", &[(PropertyKind::Field, "A.f")]);
        let b = method("A.y", &[(PropertyKind::Field, "A.f")]);
        assert_relative_eq!(a.distance(&b), 0.0);
    }

    #[test]
    fn test_disjoint_relations_infinite() {
        let a = method("A.x", &[(PropertyKind::Field, "A.f")]);
        let b = method("A.y", &[(PropertyKind::Field, "A.g")]);
        assert!(a.distance(&b).is_infinite());
        assert!(b.distance(&a).is_infinite());
    }

    #[test]
    fn test_partial_overlap() {
        let a = method(
            "A.x",
            &[(PropertyKind::Field, "A.f"), (PropertyKind::Method, "A.y")],
        );
        let b = method("A.y", &[(PropertyKind::Field, "A.f")]);
        // intersection 1, union 2
        assert_relative_eq!(a.distance(&b), 0.5f64.sqrt());
    }

    #[test]
    fn test_feature_term_same_kind() {
        assert_relative_eq!(feature_term(&[1.0, 2.0], &[1.0, 0.0], true), 4.0 / 3.0);
        assert_relative_eq!(feature_term(&[1.0], &[1.0, 3.0], true), 9.0 / 3.0);
        assert_relative_eq!(feature_term(&[], &[], true), 0.0);
    }

    #[test]
    fn test_feature_term_cross_kind_uses_magnitudes() {
        assert_relative_eq!(feature_term(&[1.0, 1.0], &[1.0, 1.0], false), 4.0 / 3.0);
    }

    #[test]
    fn test_class_and_method_distance_includes_magnitudes() {
        let class = Entity::class("A")
            .with_features(vec![1.0])
            .with_relation(PropertyKind::Class, "A", 1);
        let member = Entity::method("A.m", "A")
            .with_features(vec![1.0])
            .with_relation(PropertyKind::Class, "A", 1);
        // vector term (1 + 1) / 2, relation term 0
        assert_relative_eq!(class.distance(&member), 1.0);
        assert_relative_eq!(member.distance(&class), 1.0);
    }

    #[test]
    fn test_jaccard_distance() {
        let a: HashSet<&str> = ["A", "B"].into_iter().collect();
        let b: HashSet<&str> = ["B", "C"].into_iter().collect();
        let empty: HashSet<&str> = HashSet::new();
        assert_relative_eq!(jaccard_distance(&a, &b), 1.0 - 1.0 / 3.0);
        assert_relative_eq!(jaccard_distance(&empty, &empty), 1.0);
        assert_relative_eq!(jaccard_distance(&a, &a), 0.0);
    }
}
