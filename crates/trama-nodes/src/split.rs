//! Fan-out into two branches.
//!
//! The steal protocol gives every buffer a single owner, so fanning a signal
//! out requires an explicit split: output 0 passes the stolen input buffer
//! on, output 1 carries a fresh copy.

use trama_core::{NodeRuntime, NodeSpec, OutputAlloc, RenderScope, RuntimeSettings};

/// One input, two outputs with identical content.
pub static SPLIT: NodeSpec = NodeSpec {
    id: "split",
    audio_inputs: 1,
    audio_outputs: &[OutputAlloc::PassThrough(0), OutputAlloc::AsInput(0)],
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
        scope.clear_output(1);
        return;
    };
    match scope.alloc(input.channels) {
        Some(copy) => {
            let (src, dst) = scope.read_write(input, copy);
            dst.copy_from_slice(src);
            scope.set_output(1, copy);
        }
        None => scope.clear_output(1),
    }
    scope.set_output(0, input);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dc::DC;
    use trama_core::{CompiledGraph, GraphDescription, GraphMemory, NodeInstance, RuntimeSettings};

    #[test]
    fn both_branches_carry_the_signal() {
        let mut desc = GraphDescription::new();
        let dc = desc.add_node(NodeInstance::new(&DC));
        let split = desc.add_node(NodeInstance::new(&SPLIT).audio_from(0, dc, 0));

        let settings = RuntimeSettings::default();
        let memory = GraphMemory::allocate(&desc, &settings).unwrap();
        let mut graph = CompiledGraph::build(&desc, settings, memory).unwrap();
        graph.set_parameter(dc, 0, 0.75);

        graph.render(16, &[]).unwrap();
        let pass = graph.output_samples(split, 0).unwrap();
        assert!(pass.iter().all(|&s| s == 0.75));
        let copy = graph.output_samples(split, 1).unwrap();
        assert!(copy.iter().all(|&s| s == 0.75));

        // Pass-through aliases the source allocation; the copy does not.
        let pass_buf = graph.output_buffer(split, 0).unwrap();
        let copy_buf = graph.output_buffer(split, 1).unwrap();
        assert_ne!(pass_buf.id, copy_buf.id);
    }
}
