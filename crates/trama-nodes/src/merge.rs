//! Fan-in: sums two branches into one.
//!
//! Steals input 0 and accumulates input 1 into it. If exactly one side is
//! live, that buffer passes through when its channel count matches the
//! stamped output; mismatched channel counts emit silence.

use trama_core::{NodeRuntime, NodeSpec, OutputAlloc, RenderScope, RuntimeSettings};

/// Two inputs summed into one output.
pub static MERGE: NodeSpec = NodeSpec {
    id: "merge",
    audio_inputs: 2,
    audio_outputs: &[OutputAlloc::PassThrough(0)],
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
    let first = scope.steal_input(0);
    let second = scope.steal_input(1);
    match (first, second) {
        (None, None) => scope.clear_output(0),
        (Some(live), None) | (None, Some(live)) => {
            if live.channels == scope.output_channels(0) {
                scope.set_output(0, live);
            } else {
                scope.clear_output(0);
            }
        }
        (Some(a), Some(b)) => {
            if a.channels != b.channels {
                scope.clear_output(0);
                return;
            }
            let (src, dst) = scope.read_write(b, a);
            for (d, s) in dst.iter_mut().zip(src) {
                *d += s;
            }
            scope.set_output(0, a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dc::DC;
    use crate::split::SPLIT;
    use trama_core::{CompiledGraph, GraphDescription, GraphMemory, NodeInstance, RuntimeSettings};

    #[test]
    fn sums_both_branches() {
        let mut desc = GraphDescription::new();
        let dc = desc.add_node(NodeInstance::new(&DC));
        let split = desc.add_node(NodeInstance::new(&SPLIT).audio_from(0, dc, 0));
        let merge = desc.add_node(
            NodeInstance::new(&MERGE)
                .audio_from(0, split, 0)
                .audio_from(1, split, 1),
        );

        let settings = RuntimeSettings::default();
        let memory = GraphMemory::allocate(&desc, &settings).unwrap();
        let mut graph = CompiledGraph::build(&desc, settings, memory).unwrap();
        graph.set_parameter(dc, 0, 0.25);

        graph.render(16, &[]).unwrap();
        let samples = graph.output_samples(merge, 0).unwrap();
        assert!(samples.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn one_silent_side_passes_the_other() {
        let mut desc = GraphDescription::new();
        let dc = desc.add_node(NodeInstance::new(&DC));
        // Input 0 left unwired: silence.
        let merge = desc.add_node(NodeInstance::new(&MERGE).audio_from(1, dc, 0));

        let settings = RuntimeSettings::default();
        let memory = GraphMemory::allocate(&desc, &settings);
        // Output is PassThrough(0), which references the unconnected input 0.
        assert!(memory.is_err());
    }
}
