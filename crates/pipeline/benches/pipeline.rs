//! Worker pool benchmark suite
//!
//! Parse, rewrite and route through blackhole and unconsumed host queues.
//!
//! Run with: `cargo bench -p relay-pipeline`

use std::str::FromStr;
use std::sync::Arc;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use relay_config::ClustersConfig;
use relay_pipeline::{WorkerOptions, WorkerPool};
use relay_protocol::{Bytes, Payload, Record};
use relay_routing::Rules;
use relay_sinks::{ClusterSet, HostOptions};
use relay_transform::{Rewrite, Rewriter};

const CLUSTERS: &str = r#"
[[clusters]]
name = "devnull"
type = "blackhole"

[[clusters]]
name = "ring"
type = "jump"
hosts = [
    { name = "127.0.0.1", index = 0, port = 1 },
    { name = "127.0.0.1", index = 1, port = 2 },
    { name = "127.0.0.1", index = 2, port = 3 },
]
"#;

fn build_pool(rewrites: Vec<Rewrite>) -> WorkerPool {
    let config = ClustersConfig::from_str(CLUSTERS).unwrap();
    let options = HostOptions {
        queue_size: 1,
        ..HostOptions::default()
    };
    // Streamers are dropped: host pushes fail fast, like a saturated downstream
    let (set, _streamers) = ClusterSet::from_config(&config, Arc::new(options)).unwrap();
    let rules = Rules::builder(&set.names())
        .rule(&["^servers\\.", "^apps\\."], &[] as &[&str], &["ring"], true)
        .rule(&[".*"], &[] as &[&str], &["devnull"], false)
        .build()
        .unwrap();
    WorkerPool::new(rules, Rewriter::new(rewrites), set, WorkerOptions::default())
}

fn bench_process_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_line");
    group.throughput(Throughput::Elements(1));

    let line = Bytes::from_static(b"servers.web01.cpu.user 42.5 1700000000");

    let plain = build_pool(Vec::new());
    group.bench_function("no_rewrite", |b| {
        let mut scratch: Vec<Record> = Vec::new();
        b.iter(|| plain.process_line(black_box(&line), &mut scratch));
    });

    let rewriting = build_pool(vec![
        Rewrite::new("^servers\\.web", "servers.app", false).unwrap(),
        Rewrite::new("^servers\\.(.*)$", "mirror.$1", true).unwrap(),
    ]);
    group.bench_function("rewrite_copy", |b| {
        let mut scratch: Vec<Record> = Vec::new();
        b.iter(|| rewriting.process_line(black_box(&line), &mut scratch));
    });

    group.finish();
}

fn bench_process_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_batch");
    let pool = build_pool(Vec::new());

    for size in [10usize, 100, 1000] {
        let lines = (0..size)
            .map(|i| Bytes::from(format!("apps.host{i}.requests {i} 1700000000")))
            .collect();
        let payload = Payload::Batch(lines);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("{size}"), |b| {
            let mut scratch: Vec<Record> = Vec::new();
            b.iter(|| pool.process(black_box(&payload), &mut scratch));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_process_line, bench_process_batch);
criterion_main!(benches);
