//! Property-based tests for layout planning and trigger capacity, using
//! proptest for randomized topology and load generation.

use proptest::prelude::*;
use trama_core::{
    CompiledGraph, FireError, GraphDescription, GraphMemory, NodeInstance, RuntimeSettings,
    measure,
};
use trama_nodes::{DC, GAIN, MERGE, SINE, SPLIT, TO_STEREO};

/// Builds a random but valid feed-forward chain: a source followed by a mix
/// of single-input processors, with an optional split/merge diamond at the
/// end.
fn random_chain(processors: &[u8], diamond: bool) -> GraphDescription {
    let mut desc = GraphDescription::new();
    let mut prev = desc.add_node(NodeInstance::new(&DC));
    for &kind in processors {
        let spec = match kind % 3 {
            0 => &GAIN,
            1 => &TO_STEREO,
            _ => &GAIN,
        };
        prev = desc.add_node(NodeInstance::new(spec).audio_from(0, prev, 0));
    }
    if diamond {
        let split = desc.add_node(NodeInstance::new(&SPLIT).audio_from(0, prev, 0));
        let gain = desc.add_node(NodeInstance::new(&GAIN).audio_from(0, split, 0));
        desc.add_node(
            NodeInstance::new(&MERGE)
                .audio_from(0, gain, 0)
                .audio_from(1, split, 1),
        );
    }
    desc
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Measure is a pure function: identical inputs yield identical sizes,
    /// and the allocated memory always reports the measured footprint.
    #[test]
    fn measure_is_pure_over_random_chains(
        processors in prop::collection::vec(0u8..3, 0..12),
        diamond in any::<bool>(),
        max_batch in 16u32..512,
    ) {
        let desc = random_chain(&processors, diamond);
        let settings = RuntimeSettings {
            sample_rate: 48_000,
            max_batch_frames: max_batch,
            max_trigger_events: 8,
        };
        let a = measure(&desc, &settings).unwrap();
        let b = measure(&desc, &settings).unwrap();
        prop_assert_eq!(a, b);

        let memory = GraphMemory::allocate(&desc, &settings).unwrap();
        prop_assert_eq!(memory.footprint(), a);
    }

    /// Any batch size up to the measured maximum renders; every batch leaves
    /// the terminal node with the declared channel count.
    #[test]
    fn random_chains_render_at_any_valid_batch_size(
        processors in prop::collection::vec(0u8..3, 0..10),
        diamond in any::<bool>(),
        batches in prop::collection::vec(1usize..256, 1..6),
    ) {
        let desc = random_chain(&processors, diamond);
        let settings = RuntimeSettings {
            sample_rate: 48_000,
            max_batch_frames: 256,
            max_trigger_events: 8,
        };
        let last = (desc.nodes.len() - 1) as u16;
        let memory = GraphMemory::allocate(&desc, &settings).unwrap();
        let mut graph = CompiledGraph::build(&desc, settings, memory).unwrap();

        for frames in batches {
            graph.render(frames, &[]).unwrap();
            let channels = graph.output_channels(last, 0).unwrap();
            prop_assert!(channels == 1 || channels == 2);
            if let Some(samples) = graph.output_samples(last, 0) {
                prop_assert_eq!(samples.len(), channels as usize * frames);
                prop_assert!(samples.iter().all(|s| s.is_finite()));
            }
        }
    }

    /// For any capacity and fire count, exactly `min(fires, capacity)` fires
    /// land and the rest report a full queue.
    #[test]
    fn trigger_queue_admits_exactly_its_capacity(
        capacity in 1u16..64,
        fires in 0usize..128,
    ) {
        let mut desc = GraphDescription::new();
        let sine = desc.add_node(NodeInstance::new(&SINE));
        let settings = RuntimeSettings {
            sample_rate: 48_000,
            max_batch_frames: 64,
            max_trigger_events: capacity,
        };
        let memory = GraphMemory::allocate(&desc, &settings).unwrap();
        let mut graph = CompiledGraph::build(&desc, settings, memory).unwrap();

        let mut accepted = 0usize;
        for _ in 0..fires {
            match graph.fire_trigger(sine, 0) {
                Ok(()) => accepted += 1,
                Err(FireError::QueueFull) => {}
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
        prop_assert_eq!(accepted, fires.min(capacity as usize));
    }
}
