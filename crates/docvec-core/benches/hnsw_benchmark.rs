//! HNSW Graph Performance Benchmarks
//!
//! Run with: `cargo bench --bench hnsw_benchmark`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docvec_core::persistence::{decode_graph, encode_graph};
use docvec_core::{GraphParams, LayeredGraph};

/// Generates a random-ish vector for benchmarking.
fn generate_vector(dim: usize, seed: u64) -> Vec<f32> {
    (0..dim)
        .map(|i| ((seed as f32 * 0.1 + i as f32 * 0.01).sin() + 1.0) / 2.0)
        .collect()
}

fn build(dim: usize, count: u64) -> LayeredGraph {
    let mut graph = LayeredGraph::new(GraphParams::new(dim)).expect("params");
    for i in 0..count {
        graph.insert(&generate_vector(dim, i)).expect("insert");
    }
    graph
}

/// Benchmark graph insertion throughput.
fn bench_hnsw_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_insert");
    group.sample_size(10);

    for count in [1000u64, 5000].iter() {
        let dim = 384;
        group.throughput(Throughput::Elements(*count));

        group.bench_with_input(
            BenchmarkId::new("vectors", format!("{count}x{dim}d")),
            count,
            |b, &count| {
                b.iter(|| black_box(build(dim, count).len()));
            },
        );
    }

    group.finish();
}

/// Benchmark search latency for several `k` and `ef` values.
fn bench_hnsw_search_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_search_latency");

    let dim = 384;
    let graph = build(dim, 10_000);
    let query = generate_vector(dim, 99_999);

    for k in [10, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::new("top_k", k), k, |b, &k| {
            b.iter(|| black_box(graph.search(&query, k, 50).expect("search")));
        });
    }
    for ef in [16, 64, 256].iter() {
        group.bench_with_input(BenchmarkId::new("ef", ef), ef, |b, &ef| {
            b.iter(|| black_box(graph.search(&query, 10, ef).expect("search")));
        });
    }

    group.finish();
}

/// Benchmark the persistence codec.
fn bench_graph_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_codec");
    let graph = build(128, 5000);
    let bytes = encode_graph(&graph, 0).expect("encode");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("encode_5000x128d", |b| {
        b.iter(|| black_box(encode_graph(&graph, 0).expect("encode")));
    });
    group.bench_function("decode_5000x128d", |b| {
        b.iter(|| black_box(decode_graph(&bytes).expect("decode")));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_hnsw_insert,
    bench_hnsw_search_latency,
    bench_graph_codec
);
criterion_main!(benches);
