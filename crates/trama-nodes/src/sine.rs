//! Sine oscillator with a Start/Stop trigger gate.
//!
//! Frequency changes are smoothed with a one-pole filter
//! (`(15·target + state) / 16` per batch); oscillator phase persists in a
//! hidden parameter slot. The playing flag lives in one context byte and
//! defaults to running, so an unwired oscillator behaves like a plain
//! generator.

use trama_core::{
    NodeRuntime, NodeSpec, OutputAlloc, ParamSpec, RenderScope, RuntimeSettings, TriggerSpec,
};

/// Target frequency in Hz.
pub const PARAM_FREQUENCY: usize = 0;
/// Smoothed frequency state (hidden).
const PARAM_SMOOTHED_FREQUENCY: usize = 1;
/// Oscillator phase state (hidden).
const PARAM_PHASE: usize = 2;

/// Trigger input: start playing.
pub const TRIGGER_START: u8 = 0;
/// Trigger input: stop playing (output goes silent).
pub const TRIGGER_STOP: u8 = 1;

const TAU: f32 = core::f32::consts::TAU;

/// Mono sine generator, gated by Start/Stop trigger events.
pub static SINE: NodeSpec = NodeSpec {
    id: "sine",
    audio_inputs: 0,
    audio_outputs: &[OutputAlloc::Fixed(1)],
    params: &[
        ParamSpec {
            name: Some("Frequency"),
            default: 440.0,
        },
        ParamSpec {
            name: None,
            default: 440.0,
        },
        ParamSpec {
            name: None,
            default: 0.0,
        },
    ],
    resources: 0,
    trigger_inputs: &[
        TriggerSpec {
            name: Some("Start"),
        },
        TriggerSpec { name: Some("Stop") },
    ],
    trigger_outputs: &[],
    runtime,
};

fn runtime(_: &RuntimeSettings) -> NodeRuntime {
    NodeRuntime {
        render,
        init: Some(init),
        context_bytes: 1,
    }
}

fn init(_: &RuntimeSettings, context: &mut [u8]) {
    // Running by default.
    context[0] = 1;
}

fn render(scope: &mut RenderScope<'_>) {
    let mut playing = scope.context()[0] != 0;
    for &event in scope.events() {
        match event {
            TRIGGER_START => playing = true,
            TRIGGER_STOP => playing = false,
            _ => {}
        }
    }
    scope.context()[0] = u8::from(playing);

    let target = scope.param(PARAM_FREQUENCY);
    let smoothed = (target * 15.0 + scope.param(PARAM_SMOOTHED_FREQUENCY)) / 16.0;
    scope.set_param(PARAM_SMOOTHED_FREQUENCY, smoothed);

    if !playing {
        scope.clear_output(0);
        return;
    }
    let Some(out) = scope.alloc(1) else {
        scope.clear_output(0);
        return;
    };

    let step = TAU * smoothed / scope.sample_rate() as f32;
    let mut phase = scope.param(PARAM_PHASE);
    for sample in scope.samples_mut(out) {
        *sample = libm::sinf(phase);
        phase += step;
        if phase > TAU {
            phase -= TAU;
        }
    }
    scope.set_param(PARAM_PHASE, phase);
    scope.set_output(0, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use trama_core::{CompiledGraph, GraphDescription, GraphMemory, NodeInstance};

    fn oscillator() -> (CompiledGraph, u16) {
        let mut desc = GraphDescription::new();
        let sine = desc.add_node(NodeInstance::new(&SINE));
        let settings = RuntimeSettings::default();
        let memory = GraphMemory::allocate(&desc, &settings).unwrap();
        (CompiledGraph::build(&desc, settings, memory).unwrap(), sine)
    }

    #[test]
    fn runs_by_default_and_stays_bounded() {
        let (mut graph, sine) = oscillator();
        graph.render(256, &[]).unwrap();
        let samples = graph.output_samples(sine, 0).unwrap();
        assert_eq!(samples.len(), 256);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
        // Not silence.
        assert!(samples.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn stop_and_start_gate_the_output() {
        let (mut graph, sine) = oscillator();
        graph.fire_trigger(sine, TRIGGER_STOP).unwrap();
        graph.render(64, &[]).unwrap();
        assert!(graph.output_samples(sine, 0).is_none());

        graph.fire_trigger(sine, TRIGGER_START).unwrap();
        graph.render(64, &[]).unwrap();
        assert!(graph.output_samples(sine, 0).is_some());
    }

    #[test]
    fn phase_is_continuous_across_batches() {
        let (mut graph, sine) = oscillator();
        graph.set_parameter(sine, PARAM_FREQUENCY as u8, 1000.0);
        // Let the frequency smoother converge.
        for _ in 0..64 {
            graph.render(256, &[]).unwrap();
        }
        graph.render(256, &[]).unwrap();
        let tail: Vec<f32> = graph.output_samples(sine, 0).unwrap().to_vec();
        graph.render(256, &[]).unwrap();
        let head = graph.output_samples(sine, 0).unwrap();
        // The first sample of the new batch continues the waveform: the jump
        // cannot exceed the per-sample step of a 1 kHz sine at 48 kHz.
        let max_step = TAU * 1000.0 / 48_000.0;
        assert!((head[0] - tail[255]).abs() <= max_step + 1e-3);
    }
}
