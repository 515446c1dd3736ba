//! Gain with zipper-free ramping, processing the stolen input in place.
//!
//! The target gain is the named `Gain` parameter; a hidden parameter slot
//! carries the smoothed value across batches. Changes ramp at most
//! 1/32 per frame, then the remainder of the batch runs at the target.

use trama_core::{NodeRuntime, NodeSpec, OutputAlloc, ParamSpec, RenderScope, RuntimeSettings};

/// Target gain factor.
pub const PARAM_GAIN: usize = 0;
/// Smoothed gain state (hidden).
const PARAM_SMOOTHED: usize = 1;

const MAX_STEP_PER_FRAME: f32 = 1.0 / 32.0;
const SETTLE_EPSILON: f32 = 0.001;

/// Ramped gain over 1 or 2 channels. Steals its input buffer and scales it
/// in place; settled zero gain emits silence without touching samples.
pub static GAIN: NodeSpec = NodeSpec {
    id: "gain",
    audio_inputs: 1,
    audio_outputs: &[OutputAlloc::PassThrough(0)],
    params: &[
        ParamSpec {
            name: Some("Gain"),
            default: 1.0,
        },
        ParamSpec {
            name: None,
            default: 1.0,
        },
    ],
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
    let target = scope.param(PARAM_GAIN);
    let current = scope.param(PARAM_SMOOTHED);

    let Some(buf) = scope.steal_input(0) else {
        // Nothing to ramp across; snap so a reappearing signal does not
        // ramp from a stale value.
        scope.set_param(PARAM_SMOOTHED, target);
        scope.clear_output(0);
        return;
    };
    if buf.channels == 0 || buf.channels > 2 {
        scope.set_param(PARAM_SMOOTHED, target);
        scope.clear_output(0);
        return;
    }

    if (target - current).abs() < SETTLE_EPSILON {
        scope.set_param(PARAM_SMOOTHED, target);
        if target.abs() < SETTLE_EPSILON {
            scope.clear_output(0);
            return;
        }
        for sample in scope.samples_mut(buf) {
            *sample *= target;
        }
        scope.set_output(0, buf);
        return;
    }

    let channels = buf.channels as usize;
    let frames = scope.frames();
    let step_count = ((target - current).abs() / MAX_STEP_PER_FRAME) as usize;
    let ramp_frames = step_count.min(frames);
    let step = if target > current {
        MAX_STEP_PER_FRAME
    } else {
        -MAX_STEP_PER_FRAME
    };

    let mut gain = current;
    let samples = scope.samples_mut(buf);
    for frame in 0..ramp_frames {
        for sample in &mut samples[frame * channels..(frame + 1) * channels] {
            *sample *= gain;
        }
        gain += step;
    }
    for sample in &mut samples[ramp_frames * channels..] {
        *sample *= target;
    }

    scope.set_param(PARAM_SMOOTHED, target);
    scope.set_output(0, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dc::DC;
    use trama_core::{CompiledGraph, GraphDescription, GraphMemory, NodeInstance};

    fn chain() -> (CompiledGraph, u16) {
        let mut desc = GraphDescription::new();
        let dc = desc.add_node(NodeInstance::new(&DC));
        let gain = desc.add_node(NodeInstance::new(&GAIN).audio_from(0, dc, 0));
        let settings = RuntimeSettings::default();
        let memory = GraphMemory::allocate(&desc, &settings).unwrap();
        (CompiledGraph::build(&desc, settings, memory).unwrap(), gain)
    }

    #[test]
    fn settled_gain_scales_flat() {
        let (mut graph, gain) = chain();
        graph.set_parameter(gain, PARAM_GAIN as u8, 0.5);
        // First batch ramps from the default 1.0; second batch is settled.
        graph.render(256, &[]).unwrap();
        graph.render(256, &[]).unwrap();
        let samples = graph.output_samples(gain, 0).unwrap();
        assert!(samples.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn ramp_is_bounded_per_frame() {
        let (mut graph, gain) = chain();
        graph.set_parameter(gain, PARAM_GAIN as u8, 0.0);
        graph.render(16, &[]).unwrap();
        let samples: Vec<f32> = graph.output_samples(gain, 0).unwrap().to_vec();
        for (f, pair) in samples.windows(2).enumerate() {
            assert!(
                (pair[0] - pair[1]).abs() <= MAX_STEP_PER_FRAME + 1e-6,
                "step too large at frame {f}"
            );
        }
    }

    #[test]
    fn settled_zero_gain_emits_silence() {
        let (mut graph, gain) = chain();
        graph.set_parameter(gain, PARAM_GAIN as u8, 0.0);
        graph.render(256, &[]).unwrap();
        graph.render(256, &[]).unwrap();
        assert!(graph.output_samples(gain, 0).is_none());
    }
}
