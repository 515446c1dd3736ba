//! One-shot clip player over a host-installed resource.
//!
//! Resource slot 0 holds the mono clip. Each Play event restarts the cursor;
//! playback runs to the end of the clip and stops. Cursor and active flag
//! persist in context memory.

use crate::context::{read_u32, write_u32};
use trama_core::{
    NodeRuntime, NodeSpec, OutputAlloc, ParamSpec, RenderScope, RuntimeSettings, TriggerSpec,
};

/// Playback gain.
pub const PARAM_GAIN: usize = 0;

/// Trigger input: (re)start playback from the top of the clip.
pub const TRIGGER_PLAY: u8 = 0;

/// Resource slot holding the clip samples.
pub const RESOURCE_CLIP: usize = 0;

const CONTEXT_CURSOR: usize = 0;
const CONTEXT_ACTIVE: usize = 4;

/// Mono one-shot sample player.
pub static SAMPLER: NodeSpec = NodeSpec {
    id: "sampler",
    audio_inputs: 0,
    audio_outputs: &[OutputAlloc::Fixed(1)],
    params: &[ParamSpec {
        name: Some("Gain"),
        default: 1.0,
    }],
    resources: 1,
    trigger_inputs: &[TriggerSpec { name: Some("Play") }],
    trigger_outputs: &[],
    runtime,
};

fn runtime(_: &RuntimeSettings) -> NodeRuntime {
    NodeRuntime {
        render,
        init: None,
        context_bytes: 5,
    }
}

fn render(scope: &mut RenderScope<'_>) {
    let mut restart = false;
    for &event in scope.events() {
        if event == TRIGGER_PLAY {
            restart = true;
        }
    }

    let mut cursor;
    let mut active;
    {
        let context = scope.context();
        cursor = read_u32(&context[CONTEXT_CURSOR..]) as usize;
        active = context[CONTEXT_ACTIVE] != 0;
    }
    if restart {
        cursor = 0;
        active = true;
    }

    // The Arc clone keeps the clip readable while the arena is borrowed.
    let clip = scope.resource(RESOURCE_CLIP).map(|r| r.samples.clone());
    let gain = scope.param(PARAM_GAIN);

    match clip {
        Some(clip) if active => match scope.alloc(1) {
            Some(out) => {
                let samples = scope.samples_mut(out);
                let available = clip.len().saturating_sub(cursor);
                let copied = available.min(samples.len());
                for (dst, &src) in samples[..copied].iter_mut().zip(&clip[cursor..cursor + copied])
                {
                    *dst = src * gain;
                }
                samples[copied..].fill(0.0);
                cursor += copied;
                if cursor >= clip.len() {
                    active = false;
                }
                scope.set_output(0, out);
            }
            None => scope.clear_output(0),
        },
        _ => scope.clear_output(0),
    }

    let context = scope.context();
    write_u32(&mut context[CONTEXT_CURSOR..], cursor as u32);
    context[CONTEXT_ACTIVE] = u8::from(active);
}

#[cfg(test)]
mod tests {
    use super::*;
    use trama_core::{CompiledGraph, GraphDescription, GraphMemory, NodeInstance, Resource};

    fn player() -> (CompiledGraph, u16) {
        let mut desc = GraphDescription::new();
        let sampler = desc.add_node(NodeInstance::new(&SAMPLER));
        let settings = RuntimeSettings::default();
        let memory = GraphMemory::allocate(&desc, &settings).unwrap();
        let mut graph = CompiledGraph::build(&desc, settings, memory).unwrap();
        let clip: Vec<f32> = (1..=100).map(|i| i as f32 / 100.0).collect();
        assert!(graph.set_resource(sampler, 0, Resource::clip(clip, 1)));
        (graph, sampler)
    }

    #[test]
    fn silent_until_played_then_plays_once() {
        let (mut graph, sampler) = player();

        graph.render(64, &[]).unwrap();
        assert!(graph.output_samples(sampler, 0).is_none());

        graph.fire_trigger(sampler, TRIGGER_PLAY).unwrap();
        graph.render(64, &[]).unwrap();
        let first = graph.output_samples(sampler, 0).unwrap();
        assert_eq!(first[0], 0.01);
        assert_eq!(first[63], 0.64);

        // Second batch drains the remaining 36 samples, then pads silence.
        graph.render(64, &[]).unwrap();
        let second = graph.output_samples(sampler, 0).unwrap();
        assert_eq!(second[35], 1.0);
        assert_eq!(second[36], 0.0);

        // Clip exhausted: silent again.
        graph.render(64, &[]).unwrap();
        assert!(graph.output_samples(sampler, 0).is_none());
    }

    #[test]
    fn play_retriggers_from_the_top() {
        let (mut graph, sampler) = player();
        graph.fire_trigger(sampler, TRIGGER_PLAY).unwrap();
        graph.render(64, &[]).unwrap();

        graph.fire_trigger(sampler, TRIGGER_PLAY).unwrap();
        graph.render(64, &[]).unwrap();
        let samples = graph.output_samples(sampler, 0).unwrap();
        assert_eq!(samples[0], 0.01);
    }
}
