//! The compiled runtime graph: flat pre-sized pools and the host-facing API.
//!
//! [`CompiledGraph`] is produced once by [`CompiledGraph::build`] and then
//! driven with [`render`](CompiledGraph::render) /
//! [`render_dependency_ordered`](CompiledGraph::render_dependency_ordered)
//! every batch. All storage is carved out of a [`GraphMemory`] block at build
//! time; nothing allocates after that.
//!
//! Index-based accessors here are the raw API the access layer delegates to.

use std::sync::Arc;

use crate::description::{
    NodeIndex, NodeSpec, ParamIndex, ResourceIndex, RuntimeSettings, SocketIndex, TriggerIndex,
};
use crate::scratch::{AudioBuffer, BufferId, ScratchArena};
use crate::trigger::{self, FireError, TriggerRoute};

/// Handle into the output-socket pool, stored in each audio input slot.
///
/// Slot 0 is the permanent "unconnected" sentinel: its socket never carries a
/// buffer, so an unwired input reads as silence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct OutputSlot(pub(crate) u32);

impl OutputSlot {
    pub(crate) const SILENT: Self = Self(0);
}

/// One audio output socket: the buffer produced this batch (if any) and the
/// channel count stamped at build time by the socket resolver.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OutputSocket {
    pub buffer: Option<BufferId>,
    pub channels: u8,
}

impl OutputSocket {
    pub(crate) const EMPTY: Self = Self {
        buffer: None,
        channels: 0,
    };
}

/// Immutable sample data a node reads through one of its resource slots
/// (e.g. a clip for the sampler node). Set by the host after build.
#[derive(Clone, Debug)]
pub struct Resource {
    /// Interleaved sample data.
    pub samples: Arc<[f32]>,
    /// Channel count of `samples`.
    pub channels: u8,
}

impl Resource {
    /// Wraps sample data as a resource.
    pub fn clip(samples: impl Into<Arc<[f32]>>, channels: u8) -> Self {
        Self {
            samples: samples.into(),
            channels,
        }
    }
}

/// Per-instance record: resolved render callback plus this node's offsets
/// into every pool. Counts come from the shared [`NodeSpec`].
#[derive(Clone, Copy)]
pub(crate) struct NodeRecord {
    pub spec: &'static NodeSpec,
    pub render: crate::description::RenderFn,
    pub params_offset: u32,
    pub resources_offset: u32,
    pub inputs_offset: u32,
    pub outputs_offset: u32,
    pub queue_offset: u32,
    pub queue_len: u16,
    pub routes_offset: u32,
    pub deps_offset: u32,
    pub deps_len: u16,
    pub context_offset: u32,
    pub context_len: u32,
}

/// One entry of the dependency-annotated job list an external task scheduler
/// consumes. Views into the compiled graph; rebuilt on demand, no identity.
#[derive(Clone, Copy, Debug)]
pub struct RenderJob<'g> {
    /// Node to execute.
    pub node: NodeIndex,
    /// Nodes that must have executed first (deduplicated audio producers).
    pub dependencies: &'g [NodeIndex],
}

/// A fully built, immutable-topology runtime graph.
pub struct CompiledGraph {
    pub(crate) settings: RuntimeSettings,
    pub(crate) external_count: u8,
    pub(crate) records: Vec<NodeRecord>,
    pub(crate) params: Vec<f32>,
    pub(crate) resources: Vec<Option<Resource>>,
    pub(crate) input_slots: Vec<OutputSlot>,
    pub(crate) sockets: Vec<OutputSocket>,
    pub(crate) deps: Vec<NodeIndex>,
    pub(crate) routes: Vec<TriggerRoute>,
    pub(crate) trigger_events: Vec<TriggerIndex>,
    pub(crate) context: Vec<u8>,
    pub(crate) arena: ScratchArena,
    pub(crate) rendered: Vec<bool>,
}

impl CompiledGraph {
    /// Number of node instances.
    pub fn node_count(&self) -> usize {
        self.records.len()
    }

    /// The settings the graph was built with.
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    // --- Parameters ---

    /// Sets a parameter by node and parameter index.
    ///
    /// Returns `false` if either index is out of range.
    pub fn set_parameter(&mut self, node: NodeIndex, param: ParamIndex, value: f32) -> bool {
        match self.param_index(node, param) {
            Some(idx) => {
                self.params[idx] = value;
                true
            }
            None => false,
        }
    }

    /// Reads a parameter by node and parameter index.
    pub fn parameter(&self, node: NodeIndex, param: ParamIndex) -> Option<f32> {
        self.param_index(node, param).map(|idx| self.params[idx])
    }

    fn param_index(&self, node: NodeIndex, param: ParamIndex) -> Option<usize> {
        let record = self.records.get(node as usize)?;
        if param as usize >= record.spec.params.len() {
            return None;
        }
        Some(record.params_offset as usize + param as usize)
    }

    // --- Resources ---

    /// Installs a resource into one of a node's resource slots.
    ///
    /// Returns `false` if either index is out of range.
    pub fn set_resource(&mut self, node: NodeIndex, slot: ResourceIndex, resource: Resource) -> bool {
        let Some(record) = self.records.get(node as usize) else {
            return false;
        };
        if slot >= record.spec.resources {
            return false;
        }
        self.resources[record.resources_offset as usize + slot as usize] = Some(resource);
        true
    }

    // --- Triggers ---

    /// Queues an event on a node's trigger input.
    ///
    /// Fails with [`FireError::QueueFull`], without side effect, once the
    /// node's queue holds `max_trigger_events` events.
    pub fn fire_trigger(&mut self, node: NodeIndex, trigger: TriggerIndex) -> Result<(), FireError> {
        let record = *self
            .records
            .get(node as usize)
            .ok_or(FireError::UnknownTarget)?;
        if trigger as usize >= record.spec.trigger_inputs.len() {
            return Err(FireError::UnknownTarget);
        }
        let len = trigger::push_event(
            &mut self.trigger_events,
            record.queue_offset,
            record.queue_len,
            self.settings.max_trigger_events,
            trigger,
        )?;
        self.records[node as usize].queue_len = len;
        Ok(())
    }

    // --- Output access ---

    /// Channel count stamped on an output socket at build time.
    pub fn output_channels(&self, node: NodeIndex, output: SocketIndex) -> Option<u8> {
        self.socket(node, output).map(|s| s.channels)
    }

    /// The buffer an output socket produced this batch, if it still owns one.
    ///
    /// Valid until the next render call resets the arena. Comparing handles
    /// observes the aliasing protocol: a pass-through output carries the same
    /// handle as its source.
    pub fn output_buffer(&self, node: NodeIndex, output: SocketIndex) -> Option<AudioBuffer> {
        let socket = self.socket(node, output)?;
        socket.buffer.map(|id| AudioBuffer {
            id,
            channels: socket.channels,
        })
    }

    /// The samples an output socket produced this batch (`channels × frames`,
    /// interleaved). `None` if the socket is silent or out of range.
    pub fn output_samples(&self, node: NodeIndex, output: SocketIndex) -> Option<&[f32]> {
        let id = self.socket(node, output)?.buffer?;
        Some(self.arena.samples(id))
    }

    fn socket(&self, node: NodeIndex, output: SocketIndex) -> Option<&OutputSocket> {
        let record = self.records.get(node as usize)?;
        if output as usize >= record.spec.audio_outputs.len() {
            return None;
        }
        self.sockets.get(record.outputs_offset as usize + output as usize)
    }

    // --- External-scheduler seam ---

    /// The dependency-annotated job list, one entry per node in declaration
    /// order. An external task scheduler may run jobs with disjoint
    /// dependency chains concurrently; each job must run exactly once, after
    /// all of its dependencies.
    pub fn jobs(&self) -> impl Iterator<Item = RenderJob<'_>> {
        self.records.iter().enumerate().map(|(i, record)| RenderJob {
            node: i as NodeIndex,
            dependencies: &self.deps[record.deps_offset as usize..][..record.deps_len as usize],
        })
    }
}
