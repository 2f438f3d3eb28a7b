//! Property-based checks for the distance function and the search algorithms.

mod common;

use proptest::prelude::*;

use movewise_rs::algorithms::ccda::Ccda;
use movewise_rs::algorithms::hac::Hac;
use movewise_rs::algorithms::nearest_centroid::Placement;
use movewise_rs::{AlgorithmKind, CancellationToken, Entity, PropertyKind};

fn relation_set() -> impl Strategy<Value = Vec<(u8, u32)>> {
    prop::collection::vec((0u8..8, 1u32..4), 0..6)
}

fn entity_from(name: &str, relations: &[(u8, u32)], features: &[f64]) -> Entity {
    relations.iter().fold(
        Entity::method(name, "C").with_features(features.to_vec()),
        |e, &(target, weight)| e.with_relation(PropertyKind::Method, format!("C.m{target}"), weight),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn distance_is_symmetric(
        left in relation_set(),
        right in relation_set(),
        fa in prop::collection::vec(0.0f64..1.0, 2),
        fb in prop::collection::vec(0.0f64..1.0, 2),
    ) {
        let a = entity_from("C.a", &left, &fa);
        let b = entity_from("C.b", &right, &fb);
        let ab = a.distance(&b);
        let ba = b.distance(&a);
        prop_assert!(ab == ba || (ab.is_infinite() && ba.is_infinite()));
        prop_assert!(ab >= 0.0);
    }

    #[test]
    fn distance_is_infinite_without_shared_relations(
        left in relation_set(),
        right in relation_set(),
    ) {
        let a = entity_from("C.a", &left, &[]);
        let b = entity_from("C.b", &right, &[]);
        let shared = left.iter().any(|(x, _)| right.iter().any(|(y, _)| x == y));
        prop_assert_eq!(a.distance(&b).is_infinite(), !shared);
    }

    #[test]
    fn placement_picks_the_minimum(distances in prop::collection::vec(
        prop_oneof![3 => 0.0f64..2.0, 1 => Just(f64::INFINITY)], 1..8)
    ) {
        match Placement::rank(&distances) {
            Some(placement) => {
                let finite: Vec<f64> = distances.iter().copied().filter(|d| d.is_finite()).collect();
                let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
                prop_assert_eq!(placement.distance, min);
                prop_assert_eq!(distances[placement.index], min);
                prop_assert_eq!(placement.candidates, finite.len());
                prop_assert!(placement.gap >= 0.0);
                let accuracy = placement.accuracy();
                prop_assert!((0.0..=1.0).contains(&accuracy));
            }
            None => prop_assert!(distances.iter().all(|d| d.is_infinite())),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn hac_does_not_depend_on_thread_count(seed in any::<u64>()) {
        let corpus = common::synthetic(4, 4, seed);
        let single = Hac::default().cluster(&corpus, &common::context(1)).unwrap();
        let many = Hac::default().cluster(&corpus, &common::context(4)).unwrap();
        prop_assert_eq!(single.merges, many.merges);
    }

    #[test]
    fn ccda_history_is_monotone(seed in any::<u64>()) {
        let corpus = common::synthetic(4, 4, seed);
        let outcome = Ccda::default().optimize(&corpus, &common::context(2)).unwrap();
        prop_assert_eq!(outcome.deltas.len(), outcome.moves);
        for (pair, delta) in outcome.modularity_history.windows(2).zip(&outcome.deltas) {
            prop_assert!(pair[1] + 1e-12 >= pair[0]);
            prop_assert!((pair[1] - pair[0] - delta).abs() < 1e-9);
        }
    }

    #[test]
    fn every_suggestion_is_a_real_move(seed in any::<u64>()) {
        let corpus = common::synthetic(3, 4, seed);
        let engine = common::engine(2);
        let token = CancellationToken::new();
        for kind in [AlgorithmKind::Ari, AlgorithmKind::Mri, AlgorithmKind::Hac, AlgorithmKind::Rmmr] {
            let result = engine.run(kind, &corpus, &token).unwrap();
            for r in result.refactorings() {
                let unit = corpus.get(r.unit()).unwrap();
                prop_assert!(unit.is_movable());
                prop_assert_ne!(unit.class_name(), r.target());
                prop_assert!(corpus.class(r.target()).is_some());
                prop_assert!((0.0..=1.0).contains(&r.accuracy()));
            }
        }
    }
}
