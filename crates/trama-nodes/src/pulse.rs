//! Interval clock: fires its Tick trigger output every `Interval` frames.
//!
//! The frame accumulator persists in context memory, so tick spacing is
//! exact across batch boundaries regardless of batch size.

use crate::context::{read_u32, write_u32};
use trama_core::{NodeRuntime, NodeSpec, ParamSpec, RenderScope, RuntimeSettings, TriggerSpec};

/// Frames between ticks (clamped to at least 1).
pub const PARAM_INTERVAL: usize = 0;

/// Trigger output: the tick.
pub const TRIGGER_TICK: u8 = 0;

/// Audio-less event source driving other nodes' trigger inputs.
pub static PULSE: NodeSpec = NodeSpec {
    id: "pulse",
    audio_inputs: 0,
    audio_outputs: &[],
    params: &[ParamSpec {
        name: Some("Interval"),
        default: 12_000.0,
    }],
    resources: 0,
    trigger_inputs: &[],
    trigger_outputs: &[TriggerSpec { name: Some("Tick") }],
    runtime,
};

fn runtime(_: &RuntimeSettings) -> NodeRuntime {
    NodeRuntime {
        render,
        init: None,
        context_bytes: 4,
    }
}

fn render(scope: &mut RenderScope<'_>) {
    let interval = (scope.param(PARAM_INTERVAL).max(1.0)) as u32;
    let mut accumulated = read_u32(scope.context()) + scope.frames() as u32;
    let ticks = accumulated / interval;
    accumulated %= interval;
    for _ in 0..ticks {
        scope.fire(TRIGGER_TICK);
    }
    write_u32(scope.context(), accumulated);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sine::{SINE, TRIGGER_STOP};
    use trama_core::{CompiledGraph, GraphDescription, GraphMemory, NodeInstance};

    #[test]
    fn ticks_land_on_the_interval_across_batches() {
        // Pulse 0 fires Stop on sine 1 every 100 frames. The pulse renders
        // first, so the stop lands within the same batch.
        let mut desc = GraphDescription::new();
        let pulse = desc.add_node(NodeInstance::new(&PULSE));
        let sine = desc.add_node(NodeInstance::new(&SINE).trigger_from(TRIGGER_STOP, pulse, TRIGGER_TICK));

        let settings = RuntimeSettings::default();
        let memory = GraphMemory::allocate(&desc, &settings).unwrap();
        let mut graph = CompiledGraph::build(&desc, settings, memory).unwrap();
        graph.set_parameter(pulse, PARAM_INTERVAL as u8, 100.0);

        // 60 frames: no tick yet, sine still running.
        graph.render(60, &[]).unwrap();
        assert!(graph.output_samples(sine, 0).is_some());

        // 60 more frames crosses 100: tick fires, sine stops this batch.
        graph.render(60, &[]).unwrap();
        assert!(graph.output_samples(sine, 0).is_none());
    }
}
