use criterion::{black_box, criterion_group, criterion_main, Criterion};

use facegate_matcher::{euclidean_distance, recognize};
use facegate_roster::Enrollment;

fn pseudo_random_vec(dim: usize, seed: u64) -> Vec<f32> {
    let mut v = Vec::with_capacity(dim);
    let mut state = seed;
    for _ in 0..dim {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        v.push(((state >> 33) as f32) / (u32::MAX as f32) - 0.5);
    }
    v
}

fn make_candidates(n: usize, dim: usize) -> Vec<Enrollment> {
    (0..n)
        .map(|i| Enrollment {
            id: format!("id-{i:04}"),
            descriptor: pseudo_random_vec(dim, 31 + i as u64 * 997),
            zones: vec!["room-1".to_string()],
        })
        .collect()
}

fn bench_distance(c: &mut Criterion) {
    let a = pseudo_random_vec(128, 1);
    let b = pseudo_random_vec(128, 2);

    c.bench_function("euclidean_distance_128d", |bench| {
        bench.iter(|| black_box(euclidean_distance(black_box(&a), black_box(&b))));
    });
}

fn bench_recognize(c: &mut Criterion) {
    let candidates = make_candidates(1000, 128);
    let refs: Vec<&Enrollment> = candidates.iter().collect();
    let probe = pseudo_random_vec(128, 999);

    c.bench_function("recognize_128d_1000_candidates", |bench| {
        bench.iter(|| black_box(recognize(black_box(&probe), &refs, 0.6)));
    });
}

criterion_group!(benches, bench_distance, bench_recognize);
criterion_main!(benches);
