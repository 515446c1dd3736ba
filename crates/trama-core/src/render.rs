//! Per-batch execution: scratch reset, per-node views, two scheduling modes.
//!
//! A render call resets the scratch arena, stages external input samples,
//! then executes every node exactly once. *Sequential mode* walks declaration
//! order — the feed-forward invariant guarantees producers complete before
//! consumers. *Dependency mode* recursively renders a node's not-yet-rendered
//! upstream producers first, memoized through a pre-sized bitmap; with a
//! feed-forward description it visits nodes in the same order and produces
//! identical output, while exposing the explicit dependency edges an external
//! scheduler consumes via [`CompiledGraph::jobs`].
//!
//! Each callback works through a [`RenderScope`]: slices of the graph's pools
//! cut for that node, plus the arena. No allocation happens anywhere on this
//! path.

use crate::description::{SocketIndex, TriggerIndex};
use crate::graph::{CompiledGraph, OutputSlot, OutputSocket, Resource};
use crate::scratch::{AudioBuffer, ScratchArena};
use crate::trigger::{self, TriggerRoute};

/// A render call whose arguments do not fit the graph's runtime settings.
///
/// These are host-side shape errors; per-node capacity exhaustion inside a
/// batch is never reported here — affected nodes degrade to silence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// `frames` exceeds the `max_batch_frames` the graph was measured for.
    BatchTooLarge {
        /// Requested batch size.
        frames: usize,
        /// Measured upper bound.
        max: u32,
    },
    /// The number of external buffers does not match the description.
    ExternalCountMismatch {
        /// Declared external input count.
        expected: usize,
        /// Supplied buffer count.
        got: usize,
    },
    /// An external buffer's length is not `channels × frames`.
    ExternalLengthMismatch {
        /// External input index.
        external: usize,
        /// Expected sample count.
        expected: usize,
        /// Supplied sample count.
        got: usize,
    },
}

impl core::fmt::Display for RenderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BatchTooLarge { frames, max } => {
                write!(f, "batch of {frames} frames exceeds the measured maximum {max}")
            }
            Self::ExternalCountMismatch { expected, got } => {
                write!(f, "expected {expected} external buffers, got {got}")
            }
            Self::ExternalLengthMismatch {
                external,
                expected,
                got,
            } => write!(
                f,
                "external input {external}: expected {expected} samples, got {got}"
            ),
        }
    }
}

impl std::error::Error for RenderError {}

/// A node's resolved view of the graph for one batch.
///
/// Holds this node's input wiring, parameters, resources, queued trigger
/// events, trigger-output routes and context bytes, plus the shared output
/// socket pool and scratch arena. Rebuilt by pure slicing for every node on
/// every render call.
pub struct RenderScope<'g> {
    pub(crate) sample_rate: u32,
    pub(crate) frames: usize,
    pub(crate) inputs: &'g [OutputSlot],
    pub(crate) outputs_offset: usize,
    pub(crate) sockets: &'g mut [OutputSocket],
    pub(crate) params: &'g mut [f32],
    pub(crate) resources: &'g [Option<Resource>],
    pub(crate) events: &'g [TriggerIndex],
    pub(crate) routes: &'g mut [TriggerRoute],
    pub(crate) context: &'g mut [u8],
    pub(crate) arena: &'g mut ScratchArena,
}

impl RenderScope<'_> {
    /// Frames in this batch.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Graph sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count arriving at an input socket (0 when unwired).
    pub fn input_channels(&self, input: SocketIndex) -> u8 {
        self.inputs
            .get(input as usize)
            .map_or(0, |slot| self.sockets[slot.0 as usize].channels)
    }

    /// Takes ownership of the buffer arriving at an input socket.
    ///
    /// Nulls the producer's socket, signalling downstream readers of the same
    /// output that the buffer was consumed. `None` means silence: the input
    /// is unwired, or its producer emitted nothing this batch.
    pub fn steal_input(&mut self, input: SocketIndex) -> Option<AudioBuffer> {
        let slot = *self.inputs.get(input as usize)?;
        let socket = &mut self.sockets[slot.0 as usize];
        let id = socket.buffer.take()?;
        Some(AudioBuffer {
            id,
            channels: socket.channels,
        })
    }

    /// Allocates a fresh `channels × frames` buffer from the scratch arena.
    ///
    /// `None` means the arena is exhausted; treat it as synthesis failure and
    /// emit silence.
    pub fn alloc(&mut self, channels: u8) -> Option<AudioBuffer> {
        self.arena
            .alloc(channels, self.frames)
            .map(|id| AudioBuffer { id, channels })
    }

    /// Publishes a buffer on one of this node's output sockets.
    pub fn set_output(&mut self, output: SocketIndex, buffer: AudioBuffer) {
        let socket = &mut self.sockets[self.outputs_offset + output as usize];
        debug_assert_eq!(
            socket.channels, buffer.channels,
            "published buffer disagrees with the stamped channel count"
        );
        socket.buffer = Some(buffer.id);
    }

    /// Leaves an output socket silent this batch.
    pub fn clear_output(&mut self, output: SocketIndex) {
        self.sockets[self.outputs_offset + output as usize].buffer = None;
    }

    /// Channel count stamped on one of this node's outputs at build time.
    pub fn output_channels(&self, output: SocketIndex) -> u8 {
        self.sockets[self.outputs_offset + output as usize].channels
    }

    /// Read access to a buffer's samples.
    pub fn samples(&self, buffer: AudioBuffer) -> &[f32] {
        self.arena.samples(buffer.id)
    }

    /// Write access to a buffer's samples.
    pub fn samples_mut(&mut self, buffer: AudioBuffer) -> &mut [f32] {
        self.arena.samples_mut(buffer.id)
    }

    /// Read one buffer while writing another (distinct buffers).
    pub fn read_write(&mut self, read: AudioBuffer, write: AudioBuffer) -> (&[f32], &mut [f32]) {
        self.arena.pair_mut(read.id, write.id)
    }

    /// Reads a parameter of this node.
    pub fn param(&self, index: usize) -> f32 {
        self.params[index]
    }

    /// Writes a parameter of this node (smoothing state lives here).
    pub fn set_param(&mut self, index: usize, value: f32) {
        self.params[index] = value;
    }

    /// A resource slot's content, if the host installed one.
    pub fn resource(&self, slot: usize) -> Option<&Resource> {
        self.resources.get(slot)?.as_ref()
    }

    /// Trigger events queued on this node since its last render, in firing
    /// order. Each entry is a trigger-input socket index. The queue is
    /// emptied when the callback returns.
    pub fn events(&self) -> &[TriggerIndex] {
        self.events
    }

    /// Fires one of this node's trigger outputs.
    ///
    /// Recorded on the static route and delivered when the callback returns:
    /// a destination later in declaration order sees the event this batch, an
    /// earlier one next batch. Unwired outputs and full destination queues
    /// drop the fire.
    pub fn fire(&mut self, output: TriggerIndex) {
        if let Some(route) = self.routes.get_mut(output as usize) {
            route.pending = route.pending.saturating_add(1);
        }
    }

    /// This node's context bytes.
    pub fn context(&mut self) -> &mut [u8] {
        self.context
    }
}

impl CompiledGraph {
    /// Renders one batch in declaration order.
    ///
    /// `externals` supplies one interleaved `channels × frames` slice per
    /// declared external input, in declaration order.
    pub fn render(&mut self, frames: usize, externals: &[&[f32]]) -> Result<(), RenderError> {
        self.begin_batch(frames, externals)?;
        for node in 0..self.records.len() {
            self.run_node(node, frames);
        }
        Ok(())
    }

    /// Renders one batch in dependency order.
    ///
    /// Every node runs after its upstream producers, memoized through the
    /// per-render bitmap. Output is identical to [`render`](Self::render).
    pub fn render_dependency_ordered(
        &mut self,
        frames: usize,
        externals: &[&[f32]],
    ) -> Result<(), RenderError> {
        self.begin_batch(frames, externals)?;
        self.rendered.fill(false);
        for node in 0..self.records.len() {
            self.render_with_dependencies(node, frames);
        }
        Ok(())
    }

    fn render_with_dependencies(&mut self, node: usize, frames: usize) {
        if self.rendered[node] {
            return;
        }
        let offset = self.records[node].deps_offset as usize;
        let len = self.records[node].deps_len as usize;
        for k in 0..len {
            let dep = self.deps[offset + k] as usize;
            if !self.rendered[dep] {
                self.render_with_dependencies(dep, frames);
            }
        }
        self.run_node(node, frames);
        self.rendered[node] = true;
    }

    /// Resets the arena, clears every socket and stages external samples.
    fn begin_batch(&mut self, frames: usize, externals: &[&[f32]]) -> Result<(), RenderError> {
        if frames > self.settings.max_batch_frames as usize {
            return Err(RenderError::BatchTooLarge {
                frames,
                max: self.settings.max_batch_frames,
            });
        }
        if externals.len() != self.external_count as usize {
            return Err(RenderError::ExternalCountMismatch {
                expected: self.external_count as usize,
                got: externals.len(),
            });
        }
        for (e, samples) in externals.iter().enumerate() {
            let expected = self.sockets[1 + e].channels as usize * frames;
            if samples.len() != expected {
                return Err(RenderError::ExternalLengthMismatch {
                    external: e,
                    expected,
                    got: samples.len(),
                });
            }
        }

        self.arena.reset();
        for socket in &mut self.sockets {
            socket.buffer = None;
        }

        // Staging externals into the arena keeps the steal protocol uniform:
        // a consumer may take an external buffer like any node output.
        for (e, samples) in externals.iter().enumerate() {
            let channels = self.sockets[1 + e].channels;
            let Some(id) = self.arena.alloc(channels, frames) else {
                break;
            };
            self.arena.samples_mut(id).copy_from_slice(samples);
            self.sockets[1 + e].buffer = Some(id);
        }
        Ok(())
    }

    /// Builds one node's scope by slicing the pools, runs its callback,
    /// empties its drained queue and delivers its recorded fires.
    fn run_node(&mut self, node: usize, frames: usize) {
        let record = self.records[node];
        let spec = record.spec;
        {
            let mut scope = RenderScope {
                sample_rate: self.settings.sample_rate,
                frames,
                inputs: &self.input_slots[record.inputs_offset as usize..]
                    [..spec.audio_inputs as usize],
                outputs_offset: record.outputs_offset as usize,
                sockets: &mut self.sockets,
                params: &mut self.params[record.params_offset as usize..][..spec.params.len()],
                resources: &self.resources[record.resources_offset as usize..]
                    [..spec.resources as usize],
                events: &self.trigger_events[record.queue_offset as usize..]
                    [..record.queue_len as usize],
                routes: &mut self.routes[record.routes_offset as usize..]
                    [..spec.trigger_outputs.len()],
                context: &mut self.context[record.context_offset as usize..]
                    [..record.context_len as usize],
                arena: &mut self.arena,
            };
            (record.render)(&mut scope);
        }
        self.records[node].queue_len = 0;
        self.deliver_fires(record.routes_offset as usize, spec.trigger_outputs.len());
    }

    /// Routes the fires a callback recorded to their destination queues.
    fn deliver_fires(&mut self, routes_offset: usize, route_count: usize) {
        let capacity = self.settings.max_trigger_events;
        for r in routes_offset..routes_offset + route_count {
            let pending = core::mem::take(&mut self.routes[r].pending);
            let Some((dest_node, dest_trigger)) = self.routes[r].dest else {
                continue;
            };
            for _ in 0..pending {
                let record = self.records[dest_node as usize];
                let Ok(len) = trigger::push_event(
                    &mut self.trigger_events,
                    record.queue_offset,
                    record.queue_len,
                    capacity,
                    dest_trigger,
                ) else {
                    break;
                };
                self.records[dest_node as usize].queue_len = len;
            }
        }
    }
}
