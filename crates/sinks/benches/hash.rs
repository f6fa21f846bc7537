//! Benchmarks for host selection hashing
//!
//! `jump` and `lb` clusters hash every record path once.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use relay_sinks::{fnv1a_64, jump_hash};

const PATHS: [&str; 4] = [
    "a.b",
    "servers.web-01.cpu.user",
    "apps.checkout.latency.p99.eu-west-1.pod-7f9c",
    "k8s.prod.cluster-a.namespace-payments.deployment-api.container-main.memory.rss",
];

fn bench_fnv(c: &mut Criterion) {
    let mut group = c.benchmark_group("fnv1a_64");
    for path in PATHS {
        group.throughput(Throughput::Bytes(path.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(path.len()), path, |b, path| {
            b.iter(|| fnv1a_64(black_box(path.as_bytes())));
        });
    }
    group.finish();
}

fn bench_jump(c: &mut Criterion) {
    let mut group = c.benchmark_group("jump_hash");
    for buckets in [3usize, 32, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(buckets), &buckets, |b, &buckets| {
            let mut key = 0u64;
            b.iter(|| {
                key = key.wrapping_add(0x9e37_79b9_7f4a_7c15);
                jump_hash(black_box(key), buckets)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fnv, bench_jump);
criterion_main!(benches);
