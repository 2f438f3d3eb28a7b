//! Shared corpus fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use movewise_rs::{
    CancellationToken, Entity, EntityCorpus, ExecutionContext, PropertyKind, RefactoringEngine,
    MovewiseConfig,
};
use movewise_rs::core::config::PerformanceConfig;
use rand::prelude::*;

/// Two classes: `A` owns field `f` and method `g`; `B.m` only uses `A`'s members.
pub fn misplaced_method() -> EntityCorpus {
    let a_members = |e: Entity| {
        e.with_relation(PropertyKind::Class, "A", 1)
            .with_relation(PropertyKind::Field, "A.f", 1)
            .with_relation(PropertyKind::Method, "A.g", 1)
    };
    EntityCorpus::new(
        vec![
            a_members(Entity::class("A")),
            Entity::class("B")
                .with_relation(PropertyKind::Class, "B", 1)
                .with_relation(PropertyKind::Method, "B.m", 1),
        ],
        vec![
            a_members(Entity::method("A.g", "A")),
            a_members(Entity::method("B.m", "B"))
                .with_relation(PropertyKind::Class, "B", 1)
                .with_relation(PropertyKind::Method, "B.m", 1),
        ],
        vec![a_members(Entity::field("A.f", "A"))],
        true,
    )
    .expect("fixture corpus is valid")
}

/// Like [`misplaced_method`], but `B.m` carries no relation to `B` at all.
pub fn detached_method() -> EntityCorpus {
    EntityCorpus::new(
        vec![
            Entity::class("A")
                .with_relation(PropertyKind::Class, "A", 1)
                .with_relation(PropertyKind::Field, "A.f", 1)
                .with_relation(PropertyKind::Method, "A.g", 1),
            Entity::class("B")
                .with_relation(PropertyKind::Class, "B", 1)
                .with_relation(PropertyKind::Method, "B.m", 1),
        ],
        vec![
            Entity::method("A.g", "A")
                .with_relation(PropertyKind::Class, "A", 1)
                .with_relation(PropertyKind::Method, "A.g", 1)
                .with_relation(PropertyKind::Field, "A.f", 1),
            Entity::method("B.m", "B")
                .with_relation(PropertyKind::Field, "A.f", 1)
                .with_relation(PropertyKind::Method, "A.g", 1),
        ],
        vec![Entity::field("A.f", "A")
            .with_relation(PropertyKind::Class, "A", 1)
            .with_relation(PropertyKind::Field, "A.f", 1)],
        true,
    )
    .expect("fixture corpus is valid")
}

/// One class holding two method groups that share no relation.
pub fn disjoint_groups() -> EntityCorpus {
    let group = |names: [&str; 2], e: Entity| {
        e.with_relation(PropertyKind::Method, names[0], 1)
            .with_relation(PropertyKind::Method, names[1], 1)
    };
    let left = ["C.readA", "C.readB"];
    let right = ["C.writeA", "C.writeB"];
    EntityCorpus::new(
        vec![Entity::class("C").with_relation(PropertyKind::Class, "C", 1)],
        vec![
            group(left, Entity::method(left[0], "C")),
            group(left, Entity::method(left[1], "C")),
            group(right, Entity::method(right[0], "C")),
            group(right, Entity::method(right[1], "C")),
        ],
        vec![],
        false,
    )
    .expect("fixture corpus is valid")
}

/// Random corpus: every method touches its own class plus a few random members.
pub fn synthetic(classes: usize, methods_per_class: usize, seed: u64) -> EntityCorpus {
    let mut rng = StdRng::seed_from_u64(seed);
    let class_names: Vec<String> = (0..classes).map(|c| format!("pkg.C{c}")).collect();
    let method_names: Vec<(String, usize)> = (0..classes)
        .flat_map(|c| (0..methods_per_class).map(move |m| (format!("pkg.C{c}.m{m}"), c)))
        .collect();

    let class_entities = class_names
        .iter()
        .enumerate()
        .map(|(c, name)| {
            let mut class = Entity::class(name.as_str()).with_relation(PropertyKind::Class, name.as_str(), 1);
            for (method, owner) in &method_names {
                if *owner == c {
                    class = class.with_relation(PropertyKind::Method, method.as_str(), 1);
                }
            }
            class
        })
        .collect();

    let methods = method_names
        .iter()
        .map(|(name, owner)| {
            let mut method = Entity::method(name.as_str(), class_names[*owner].as_str())
                .with_relation(PropertyKind::Class, class_names[*owner].as_str(), 1)
                .with_relation(PropertyKind::Method, name.as_str(), 1)
                .with_features(vec![rng.random_range(0.0..1.0), rng.random_range(0.0..1.0)]);
            for _ in 0..3 {
                let (callee, callee_owner) = &method_names[rng.random_range(0..method_names.len())];
                method = method
                    .with_relation(PropertyKind::Method, callee.as_str(), rng.random_range(1..3))
                    .with_relation(PropertyKind::Class, class_names[*callee_owner].as_str(), 1);
            }
            method
        })
        .collect();

    EntityCorpus::new(class_entities, methods, vec![], false).expect("synthetic corpus is valid")
}

/// Engine with a small fixed pool
pub fn engine(threads: usize) -> RefactoringEngine {
    RefactoringEngine::new(MovewiseConfig {
        performance: PerformanceConfig {
            max_threads: Some(threads),
        },
        ..MovewiseConfig::default()
    })
    .expect("default configuration is valid")
}

/// Bare execution context for calling algorithms directly
pub fn context(threads: usize) -> ExecutionContext {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .expect("pool builds");
    ExecutionContext::new("test", Arc::new(pool), CancellationToken::new())
}
