//! Search algorithm benchmarks
//!
//! Measures the quadratic phases of each algorithm on synthetic corpora:
//! - HAC initial triples plus the merge loop
//! - CCDA best-move search
//! - ARI candidate evaluation at different pool sizes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;

use rand::prelude::*;

use movewise_rs::algorithms::ccda::Ccda;
use movewise_rs::algorithms::hac::Hac;
use movewise_rs::algorithms::nearest_centroid::Ari;
use movewise_rs::algorithms::RefactoringAlgorithm;
use movewise_rs::{CancellationToken, Entity, EntityCorpus, ExecutionContext, PropertyKind};

/// Generate a corpus where each method mostly talks to its own class
fn generate_corpus(classes: usize, methods_per_class: usize) -> EntityCorpus {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let class_names: Vec<String> = (0..classes).map(|c| format!("bench.C{c}")).collect();

    let class_entities = class_names
        .iter()
        .map(|name| {
            (0..methods_per_class).fold(
                Entity::class(name.as_str()).with_relation(PropertyKind::Class, name.as_str(), 1),
                |e, m| e.with_relation(PropertyKind::Method, format!("{name}.m{m}"), 1),
            )
        })
        .collect();

    let mut methods = Vec::with_capacity(classes * methods_per_class);
    for (c, owner) in class_names.iter().enumerate() {
        for m in 0..methods_per_class {
            let name = format!("{owner}.m{m}");
            let mut method = Entity::method(name.as_str(), owner.as_str())
                .with_relation(PropertyKind::Class, owner.as_str(), 1)
                .with_relation(PropertyKind::Method, name.as_str(), 1);
            for _ in 0..4 {
                // one call in four leaves the home class
                let callee_class = if rng.random_bool(0.25) {
                    rng.random_range(0..classes)
                } else {
                    c
                };
                let callee = rng.random_range(0..methods_per_class);
                method = method
                    .with_relation(
                        PropertyKind::Method,
                        format!("{}.m{callee}", class_names[callee_class]),
                        1,
                    )
                    .with_relation(PropertyKind::Class, class_names[callee_class].as_str(), 1);
            }
            methods.push(method);
        }
    }

    EntityCorpus::new(class_entities, methods, Vec::new(), false).unwrap()
}

fn context(threads: usize) -> ExecutionContext {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .unwrap();
    ExecutionContext::new("bench", Arc::new(pool), CancellationToken::new())
}

fn bench_hac(c: &mut Criterion) {
    let mut group = c.benchmark_group("hac");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let ctx = context(4);
    for classes in [5, 10, 20] {
        let corpus = generate_corpus(classes, 10);
        group.throughput(Throughput::Elements(corpus.len() as u64));
        group.bench_with_input(BenchmarkId::new("cluster", corpus.len()), &corpus, |b, corpus| {
            b.iter(|| {
                let dendrogram = Hac::default().cluster(black_box(corpus), &ctx).unwrap();
                black_box(dendrogram.merges.len())
            })
        });
    }

    group.finish();
}

fn bench_ccda(c: &mut Criterion) {
    let mut group = c.benchmark_group("ccda");
    group.sample_size(20);

    let ctx = context(4);
    for classes in [5, 10, 20] {
        let corpus = generate_corpus(classes, 10);
        group.bench_with_input(BenchmarkId::new("optimize", corpus.len()), &corpus, |b, corpus| {
            b.iter(|| {
                let outcome = Ccda::default().optimize(black_box(corpus), &ctx).unwrap();
                black_box(outcome.moves)
            })
        });
    }

    group.finish();
}

fn bench_ari_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("ari_threads");
    let corpus = generate_corpus(20, 15);

    for threads in [1, 2, 4, 8] {
        let ctx = context(threads);
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, _| {
            b.iter(|| {
                let suggestions = Ari::default().find_refactorings(black_box(&corpus), &ctx).unwrap();
                black_box(suggestions.len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hac, bench_ccda, bench_ari_threads);
criterion_main!(benches);
