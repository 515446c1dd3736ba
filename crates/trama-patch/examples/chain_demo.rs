//! Demonstration of building, compiling and rendering a sound graph.
//!
//! Assembles the classic six-node patch (DC → Gain → ToStereo → Split →
//! boost/pass → Merge), drives parameters through the access layer, and
//! renders a few batches.
//!
//! Run with: cargo run --example chain_demo

use trama_core::{CompiledGraph, GraphAccess, GraphMemory, RuntimeSettings, measure, parameter_hash};
use trama_patch::GraphBuilder;
use trama_registry::NodeCatalog;

const BATCH: usize = 128;

fn main() {
    println!("Trama Chain Demo");
    println!("================\n");

    let catalog = NodeCatalog::new();
    let mut builder = GraphBuilder::new(&catalog);

    let dc = builder.add_named("dc", "level").unwrap();
    let pre = builder.add_named("gain", "pre").unwrap();
    let stereo = builder.add("to_stereo").unwrap();
    let split = builder.add("split").unwrap();
    let boost = builder.add_named("gain", "boost").unwrap();
    let merge = builder.add("merge").unwrap();

    builder.wire(dc, 0, pre, 0).unwrap();
    builder.wire(pre, 0, stereo, 0).unwrap();
    builder.wire(stereo, 0, split, 0).unwrap();
    builder.wire(split, 0, boost, 0).unwrap();
    builder.wire(boost, 0, merge, 0).unwrap();
    builder.wire(split, 1, merge, 1).unwrap();

    let description = builder.finish();
    let settings = RuntimeSettings {
        sample_rate: 44_100,
        max_batch_frames: BATCH as u32,
        max_trigger_events: 16,
    };

    let footprint = measure(&description, &settings).unwrap();
    println!(
        "measured: graph {} B, scratch {} B, triggers {} B, context {} B",
        footprint.graph_bytes,
        footprint.scratch_bytes,
        footprint.trigger_bytes,
        footprint.context_bytes
    );

    let memory = GraphMemory::allocate(&description, &settings).unwrap();
    let mut graph = CompiledGraph::build(&description, settings, memory).unwrap();

    let access = GraphAccess::build(&description);
    access.set_parameter(&mut graph, parameter_hash("level", "Level"), 0.5);
    access.set_parameter(&mut graph, parameter_hash("pre", "Gain"), 0.5);
    access.set_parameter(&mut graph, parameter_hash("boost", "Gain"), 2.0);

    for batch in 0..4 {
        graph.render(BATCH, &[]).unwrap();
        let samples = graph.output_samples(merge, 0).unwrap();
        let rms = (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt();
        println!(
            "batch {batch}: {} samples across {} channels, rms {rms:.4}",
            samples.len(),
            graph.output_channels(merge, 0).unwrap()
        );
    }

    println!("\nexpected steady-state level: 0.75");
}
