//! Benchmarks amortized insert cost against a synthetic dataset, mirroring
//! the shape of the teacher's `clam/benches/partition.rs` (bench group +
//! `criterion_group!`/`criterion_main!`), minus the external dataset reader.

use criterion::{criterion_group, criterion_main, Criterion};
use dynatree_core::{FeatureKind, Point, Tree, TreeConfig};

fn synthetic_points(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let x = ((i * 37) % 997) as f32;
            let y = ((i * 131) % 997) as f32;
            Point::new(vec![x, y], (i * 37) % 997 > (i * 131) % 997)
        })
        .collect()
}

fn config() -> TreeConfig {
    TreeConfig {
        dimension: 2,
        feature_kinds: vec![FeatureKind::Real, FeatureKind::Real],
        max_height: 12,
        epsilon: 0.25,
        epsilon_transmission: 0.25,
        min_split_points: 4,
        min_split_gini: 0.0,
    }
}

fn amortized_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");
    group.sample_size(20);

    for &size in &[100usize, 1_000, 10_000] {
        let base = synthetic_points(size);
        group.bench_function(format!("insert_after_{size}"), |b| {
            b.iter_batched(
                || Tree::new(config(), base.clone()).unwrap(),
                |mut tree| {
                    for i in 0..100 {
                        let x = ((i * 223) % 997) as f32;
                        let y = ((i * 523) % 997) as f32;
                        tree.insert(vec![x, y], x > y);
                    }
                    tree
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, amortized_insert);
criterion_main!(benches);
