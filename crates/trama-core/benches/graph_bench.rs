//! Criterion benchmarks for the graph compiler and render executor.
//!
//! Measures graph overhead on two axes:
//!
//! - **Compile** — measure + allocate + build for linear and diamond shapes
//! - **Render** — per-batch throughput at varying batch sizes
//!
//! Run with: `cargo bench -p trama-core -- graph/`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use trama_core::{CompiledGraph, GraphDescription, GraphMemory, NodeInstance, RuntimeSettings};
use trama_nodes::{DC, GAIN, MERGE, SPLIT, TO_STEREO};

const BATCH_SIZES: &[usize] = &[64, 128, 256, 512];

fn settings(max_batch: u32) -> RuntimeSettings {
    RuntimeSettings {
        sample_rate: 48_000,
        max_batch_frames: max_batch,
        max_trigger_events: 16,
    }
}

fn linear_chain(gains: usize) -> GraphDescription {
    let mut desc = GraphDescription::new();
    let mut prev = desc.add_node(NodeInstance::new(&DC));
    for _ in 0..gains {
        prev = desc.add_node(NodeInstance::new(&GAIN).audio_from(0, prev, 0));
    }
    desc
}

fn diamond() -> GraphDescription {
    let mut desc = GraphDescription::new();
    let dc = desc.add_node(NodeInstance::new(&DC));
    let stereo = desc.add_node(NodeInstance::new(&TO_STEREO).audio_from(0, dc, 0));
    let split = desc.add_node(NodeInstance::new(&SPLIT).audio_from(0, stereo, 0));
    let gain = desc.add_node(NodeInstance::new(&GAIN).audio_from(0, split, 0));
    desc.add_node(
        NodeInstance::new(&MERGE)
            .audio_from(0, gain, 0)
            .audio_from(1, split, 1),
    );
    desc
}

fn compile(desc: &GraphDescription, settings: RuntimeSettings) -> CompiledGraph {
    let memory = GraphMemory::allocate(desc, &settings).unwrap();
    CompiledGraph::build(desc, settings, memory).unwrap()
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/compile");

    for gains in [5usize, 20] {
        group.bench_function(format!("linear_{gains}"), |b| {
            let desc = linear_chain(gains);
            b.iter(|| black_box(compile(&desc, settings(256))));
        });
    }

    group.bench_function("diamond", |b| {
        let desc = diamond();
        b.iter(|| black_box(compile(&desc, settings(256))));
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/render");

    for &batch in BATCH_SIZES {
        group.bench_with_input(
            BenchmarkId::new("linear_20", batch),
            &batch,
            |b, &batch| {
                let desc = linear_chain(20);
                let mut graph = compile(&desc, settings(batch as u32));
                b.iter(|| {
                    graph.render(batch, &[]).unwrap();
                    black_box(graph.output_samples(20, 0));
                });
            },
        );
    }

    group.bench_function("diamond_256", |b| {
        let desc = diamond();
        let mut graph = compile(&desc, settings(256));
        b.iter(|| {
            graph.render(256, &[]).unwrap();
            black_box(graph.output_samples(4, 0));
        });
    });

    group.bench_function("diamond_256_dependency_order", |b| {
        let desc = diamond();
        let mut graph = compile(&desc, settings(256));
        b.iter(|| {
            graph.render_dependency_ordered(256, &[]).unwrap();
            black_box(graph.output_samples(4, 0));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_compile, bench_render);
criterion_main!(benches);
