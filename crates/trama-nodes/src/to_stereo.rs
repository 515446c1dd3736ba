//! Mono → stereo adapter.

use trama_core::{NodeRuntime, NodeSpec, OutputAlloc, RenderScope, RuntimeSettings};

/// Duplicates a mono input into both channels of a stereo output. A stereo
/// input passes through unchanged (stolen); any other channel count emits
/// silence.
pub static TO_STEREO: NodeSpec = NodeSpec {
    id: "to_stereo",
    audio_inputs: 1,
    audio_outputs: &[OutputAlloc::Fixed(2)],
    params: &[],
    resources: 0,
    trigger_inputs: &[],
    trigger_outputs: &[],
    runtime,
};

fn runtime(_: &RuntimeSettings) -> NodeRuntime {
    NodeRuntime {
        render,
        init: None,
        context_bytes: 0,
    }
}

fn render(scope: &mut RenderScope<'_>) {
    let Some(input) = scope.steal_input(0) else {
        scope.clear_output(0);
        return;
    };
    match input.channels {
        2 => scope.set_output(0, input),
        1 => {
            let Some(out) = scope.alloc(2) else {
                scope.clear_output(0);
                return;
            };
            let (mono, stereo) = scope.read_write(input, out);
            for (frame, &sample) in mono.iter().enumerate() {
                stereo[2 * frame] = sample;
                stereo[2 * frame + 1] = sample;
            }
            scope.set_output(0, out);
        }
        _ => scope.clear_output(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dc::DC;
    use trama_core::{CompiledGraph, GraphDescription, GraphMemory, NodeInstance, RuntimeSettings};

    #[test]
    fn duplicates_mono_into_both_channels() {
        let mut desc = GraphDescription::new();
        let dc = desc.add_node(NodeInstance::new(&DC));
        let stereo = desc.add_node(NodeInstance::new(&TO_STEREO).audio_from(0, dc, 0));

        let settings = RuntimeSettings::default();
        let memory = GraphMemory::allocate(&desc, &settings).unwrap();
        let mut graph = CompiledGraph::build(&desc, settings, memory).unwrap();
        graph.set_parameter(dc, 0, 0.5);

        graph.render(32, &[]).unwrap();
        assert_eq!(graph.output_channels(stereo, 0), Some(2));
        let samples = graph.output_samples(stereo, 0).unwrap();
        assert_eq!(samples.len(), 64);
        assert!(samples.iter().all(|&s| s == 0.5));
    }
}
