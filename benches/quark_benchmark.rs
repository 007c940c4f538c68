use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hmmtag::{Quark, TextVectorizer};

fn quark(tokens: &[String]) -> usize {
    let mut quark = Quark::default();
    tokens.iter().map(|s| quark.find_or_insert(s)).sum()
}

fn quark_benchmark(c: &mut Criterion) {
    let tokens: Vec<String> = (0..100_000).map(|i| format!("tok{}", (i * 7919) % 20_000)).collect();
    c.bench_function("quark", |b| b.iter(|| quark(black_box(&tokens))));
}

criterion_group! {
    name = benchmarks;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = quark_benchmark
}

criterion_main!(benchmarks);
