//! Graph building: place node records, wire sockets, stamp channel counts,
//! run init callbacks.
//!
//! Building is the placing half of the measure/place protocol. It walks the
//! description in the same order the [`PoolPlan`](crate::plan::PoolPlan)
//! traversal did, advancing running offsets per node, so every placed offset
//! lands exactly where the plan predicted. The pass either completes fully or
//! returns an error and drops the consumed memory — a partial graph is never
//! observable.

use crate::description::{GraphDescription, NodeIndex, RuntimeSettings, SocketIndex, SourceSocket, TriggerIndex};
use crate::graph::{CompiledGraph, NodeRecord, OutputSlot, OutputSocket};
use crate::plan::{GraphMemory, PoolPlan, TopologyError};
use crate::resolve;
use crate::trigger::TriggerRoute;

/// A connection that cannot be wired. Build-time only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WiringError {
    /// A second connection arrived at an already-wired audio input.
    DuplicateFanIn {
        /// Consuming node.
        node: NodeIndex,
        /// Input socket wired twice.
        input: SocketIndex,
    },
    /// A second connection claimed an already-routed trigger output.
    DuplicateTriggerRoute {
        /// Source node.
        node: NodeIndex,
        /// Trigger output routed twice.
        trigger: TriggerIndex,
    },
}

impl core::fmt::Display for WiringError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DuplicateFanIn { node, input } => {
                write!(f, "audio input {input} of node {node} is already wired")
            }
            Self::DuplicateTriggerRoute { node, trigger } => {
                write!(f, "trigger output {trigger} of node {node} is already routed")
            }
        }
    }
}

impl std::error::Error for WiringError {}

/// Why a build produced no graph. Terminal: discard the memory and fix the
/// description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildError {
    /// The description is malformed.
    Topology(TopologyError),
    /// A connection could not be wired.
    Wiring(WiringError),
    /// The supplied memory was sized for a different description or settings.
    MemoryMismatch,
}

impl From<TopologyError> for BuildError {
    fn from(err: TopologyError) -> Self {
        Self::Topology(err)
    }
}

impl From<WiringError> for BuildError {
    fn from(err: WiringError) -> Self {
        Self::Wiring(err)
    }
}

impl core::fmt::Display for BuildError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Topology(err) => write!(f, "topology error: {err}"),
            Self::Wiring(err) => write!(f, "wiring error: {err}"),
            Self::MemoryMismatch => write!(f, "memory does not match the measured layout"),
        }
    }
}

impl std::error::Error for BuildError {}

impl CompiledGraph {
    /// Compiles a description into a runtime graph inside `memory`.
    ///
    /// Passes, in order: place node records and defaults, wire audio and
    /// trigger connections, stamp resolved channel counts (after wiring),
    /// run per-node init callbacks. Render callbacks never allocate; all
    /// pool capacity was fixed by [`GraphMemory::allocate`].
    pub fn build(
        desc: &GraphDescription,
        settings: RuntimeSettings,
        mut memory: GraphMemory,
    ) -> Result<Self, BuildError> {
        let plan = PoolPlan::new(desc, &settings)?;
        if plan != memory.plan {
            return Err(BuildError::MemoryMismatch);
        }

        place_nodes(desc, &settings, &mut memory);

        // The placing pass must land exactly on the measured counts.
        debug_assert_eq!(memory.records.len(), plan.node_count);
        debug_assert_eq!(memory.params.len(), plan.param_count);
        debug_assert_eq!(memory.resources.len(), plan.resource_count);
        debug_assert_eq!(memory.input_slots.len(), plan.input_count);
        debug_assert_eq!(memory.sockets.len(), plan.output_count);
        debug_assert_eq!(memory.deps.len(), plan.dep_count);
        debug_assert_eq!(memory.routes.len(), plan.route_count);

        wire_audio(desc, &mut memory)?;
        wire_triggers(desc, &mut memory)?;
        stamp_channels(desc, &mut memory)?;
        run_init(desc, &settings, &mut memory);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            nodes = memory.records.len(),
            sockets = memory.sockets.len(),
            "graph_build"
        );

        Ok(Self {
            settings,
            external_count: plan.external_count as u8,
            records: memory.records,
            params: memory.params,
            resources: memory.resources,
            input_slots: memory.input_slots,
            sockets: memory.sockets,
            deps: memory.deps,
            routes: memory.routes,
            trigger_events: memory.trigger_events,
            context: memory.context,
            arena: memory.arena,
            rendered: memory.rendered,
        })
    }
}

/// Places one record per node in declaration order, advancing running
/// offsets by each node's declared counts, and copies parameter defaults.
fn place_nodes(desc: &GraphDescription, settings: &RuntimeSettings, memory: &mut GraphMemory) {
    memory.sockets.push(OutputSocket::EMPTY);
    for external in &desc.externals {
        memory.sockets.push(OutputSocket {
            buffer: None,
            channels: external.channels,
        });
    }

    let mut queue_offset = 0u32;
    let mut context_offset = 0u32;

    for instance in &desc.nodes {
        let spec = instance.spec;
        let runtime = (spec.runtime)(settings);

        let deps_offset = memory.deps.len() as u32;
        instance.visit_dependencies(|dep| memory.deps.push(dep));

        let record = NodeRecord {
            spec,
            render: runtime.render,
            params_offset: memory.params.len() as u32,
            resources_offset: memory.resources.len() as u32,
            inputs_offset: memory.input_slots.len() as u32,
            outputs_offset: memory.sockets.len() as u32,
            queue_offset,
            queue_len: 0,
            routes_offset: memory.routes.len() as u32,
            deps_offset,
            deps_len: (memory.deps.len() as u32 - deps_offset) as u16,
            context_offset,
            context_len: runtime.context_bytes,
        };

        for param in spec.params {
            memory.params.push(param.default);
        }
        for _ in 0..spec.resources {
            memory.resources.push(None);
        }
        for _ in 0..spec.audio_inputs {
            memory.input_slots.push(OutputSlot::SILENT);
        }
        for _ in 0..spec.audio_outputs.len() {
            memory.sockets.push(OutputSocket::EMPTY);
        }
        for _ in 0..spec.trigger_outputs.len() {
            memory.routes.push(TriggerRoute::UNWIRED);
        }
        if !spec.trigger_inputs.is_empty() {
            queue_offset += u32::from(settings.max_trigger_events);
        }
        context_offset += runtime.context_bytes;

        memory.records.push(record);
    }
}

/// Dereferences each producer socket into the consumer's input slot.
fn wire_audio(desc: &GraphDescription, memory: &mut GraphMemory) -> Result<(), WiringError> {
    for (i, instance) in desc.nodes.iter().enumerate() {
        for conn in &instance.audio_connections {
            let slot = match conn.source {
                SourceSocket::External(external) => OutputSlot(1 + u32::from(external)),
                SourceSocket::Node { node, output } => OutputSlot(
                    memory.records[node as usize].outputs_offset + u32::from(output),
                ),
            };
            let index = memory.records[i].inputs_offset as usize + conn.input as usize;
            if memory.input_slots[index] != OutputSlot::SILENT {
                return Err(WiringError::DuplicateFanIn {
                    node: i as NodeIndex,
                    input: conn.input,
                });
            }
            memory.input_slots[index] = slot;
        }
    }
    Ok(())
}

/// Inverts consumer-declared trigger connections into each producer's static
/// route table.
fn wire_triggers(desc: &GraphDescription, memory: &mut GraphMemory) -> Result<(), WiringError> {
    for (i, instance) in desc.nodes.iter().enumerate() {
        for conn in &instance.trigger_connections {
            let index = memory.records[conn.source_node as usize].routes_offset as usize
                + conn.source_output as usize;
            let route = &mut memory.routes[index];
            if route.dest.is_some() {
                return Err(WiringError::DuplicateTriggerRoute {
                    node: conn.source_node,
                    trigger: conn.source_output,
                });
            }
            route.dest = Some((i as NodeIndex, conn.input));
        }
    }
    Ok(())
}

/// Re-runs the socket resolver to stamp every output socket's channel count.
/// Must run after wiring.
fn stamp_channels(desc: &GraphDescription, memory: &mut GraphMemory) -> Result<(), TopologyError> {
    for (i, instance) in desc.nodes.iter().enumerate() {
        let outputs_offset = memory.records[i].outputs_offset as usize;
        for output in 0..instance.spec.audio_outputs.len() {
            let channels =
                resolve::resolved_channels(desc, i as NodeIndex, output as SocketIndex)?;
            memory.sockets[outputs_offset + output].channels = channels;
        }
    }
    Ok(())
}

/// Runs each node's optional init callback against its context bytes.
fn run_init(desc: &GraphDescription, settings: &RuntimeSettings, memory: &mut GraphMemory) {
    for (i, instance) in desc.nodes.iter().enumerate() {
        let runtime = (instance.spec.runtime)(settings);
        let Some(init) = runtime.init else { continue };
        let record = &memory.records[i];
        let range = record.context_offset as usize..(record.context_offset + record.context_len) as usize;
        init(settings, &mut memory.context[range]);
    }
}
