//! Constant-level (DC) source.

use trama_core::{NodeRuntime, NodeSpec, OutputAlloc, ParamSpec, RenderScope, RuntimeSettings};

/// Output level.
pub const PARAM_LEVEL: usize = 0;

/// Mono constant source: every sample equals the `Level` parameter.
pub static DC: NodeSpec = NodeSpec {
    id: "dc",
    audio_inputs: 0,
    audio_outputs: &[OutputAlloc::Fixed(1)],
    params: &[ParamSpec {
        name: Some("Level"),
        default: 1.0,
    }],
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
    let level = scope.param(PARAM_LEVEL);
    let Some(out) = scope.alloc(1) else {
        scope.clear_output(0);
        return;
    };
    scope.samples_mut(out).fill(level);
    scope.set_output(0, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use trama_core::{CompiledGraph, GraphDescription, GraphMemory, NodeInstance};

    #[test]
    fn emits_the_level_parameter() {
        let mut desc = GraphDescription::new();
        let dc = desc.add_node(NodeInstance::new(&DC));

        let settings = RuntimeSettings::default();
        let memory = GraphMemory::allocate(&desc, &settings).unwrap();
        let mut graph = CompiledGraph::build(&desc, settings, memory).unwrap();
        graph.set_parameter(dc, 0, 0.25);

        graph.render(64, &[]).unwrap();
        let samples = graph.output_samples(dc, 0).unwrap();
        assert_eq!(samples.len(), 64);
        assert!(samples.iter().all(|&s| s == 0.25));
    }
}
