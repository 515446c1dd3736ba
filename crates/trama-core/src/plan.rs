//! Layout planning: validate the topology, measure every pool, allocate once.
//!
//! [`measure`] is the sizing half of the two-phase measure/place protocol: a
//! pure function of description + settings that reports the exact byte cost
//! of each memory region. [`GraphMemory::allocate`] performs the only
//! allocations in the system, pre-sizing every pool from the same
//! [`PoolPlan`] the builder later places into — one traversal, recorded once,
//! so the sizing and placing passes cannot disagree.
//!
//! Byte sizes mirror a single contiguous carving: each sub-pool is rounded up
//! to the alignment of the next pool's element, and the whole graph block is
//! rounded to `f32` so scratch samples could be appended directly behind it.

use crate::description::{GraphDescription, NodeIndex, RuntimeSettings, SocketIndex, TriggerIndex};
use crate::graph::{NodeRecord, OutputSlot, OutputSocket, Resource};
use crate::resolve;
use crate::scratch::ScratchArena;
use crate::trigger::TriggerRoute;

/// A malformed topology, rejected at measure/build time. Never raised during
/// rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopologyError {
    /// More nodes than the node index type can address.
    TooManyNodes {
        /// Declared node count.
        count: usize,
    },
    /// More external inputs than the socket index type can address.
    TooManyExternals {
        /// Declared external input count.
        count: usize,
    },
    /// An audio connection targets an input socket the node does not have.
    InvalidInputSocket {
        /// Consuming node.
        node: NodeIndex,
        /// Offending input socket.
        input: SocketIndex,
    },
    /// An audio connection references an output socket the producer does not
    /// have.
    InvalidOutputSocket {
        /// Producer node.
        node: NodeIndex,
        /// Offending output socket.
        output: SocketIndex,
    },
    /// An audio connection references an undeclared external input.
    InvalidExternalInput {
        /// Consuming node.
        node: NodeIndex,
        /// Offending external index.
        external: SocketIndex,
    },
    /// A producer does not precede its consumer in declaration order.
    FeedForwardViolation {
        /// Producer index as declared.
        producer: NodeIndex,
        /// Consuming node.
        consumer: NodeIndex,
    },
    /// Two connections claim the same input socket.
    DuplicateFanIn {
        /// Consuming node.
        node: NodeIndex,
        /// Input socket wired twice.
        input: SocketIndex,
    },
    /// A `PassThrough`/`AsInput` output references an input with no
    /// connection to inherit a channel count from.
    UnconnectedReference {
        /// Node owning the aliasing output.
        node: NodeIndex,
        /// Referenced, unconnected input socket.
        input: SocketIndex,
    },
    /// A trigger connection targets a trigger input the node does not have.
    InvalidTriggerInput {
        /// Consuming node.
        node: NodeIndex,
        /// Offending trigger input.
        trigger: TriggerIndex,
    },
    /// A trigger connection references a trigger output the source node does
    /// not have.
    InvalidTriggerOutput {
        /// Source node.
        node: NodeIndex,
        /// Offending trigger output.
        trigger: TriggerIndex,
    },
    /// Two trigger connections claim the same trigger output.
    DuplicateTriggerRoute {
        /// Source node.
        node: NodeIndex,
        /// Trigger output wired twice.
        trigger: TriggerIndex,
    },
}

impl core::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooManyNodes { count } => write!(f, "{count} nodes exceed the index range"),
            Self::TooManyExternals { count } => {
                write!(f, "{count} external inputs exceed the index range")
            }
            Self::InvalidInputSocket { node, input } => {
                write!(f, "node {node} has no audio input {input}")
            }
            Self::InvalidOutputSocket { node, output } => {
                write!(f, "node {node} has no audio output {output}")
            }
            Self::InvalidExternalInput { node, external } => {
                write!(f, "node {node} references undeclared external input {external}")
            }
            Self::FeedForwardViolation { producer, consumer } => {
                write!(f, "producer {producer} does not precede consumer {consumer}")
            }
            Self::DuplicateFanIn { node, input } => {
                write!(f, "audio input {input} of node {node} is wired twice")
            }
            Self::UnconnectedReference { node, input } => {
                write!(f, "output of node {node} references unconnected input {input}")
            }
            Self::InvalidTriggerInput { node, trigger } => {
                write!(f, "node {node} has no trigger input {trigger}")
            }
            Self::InvalidTriggerOutput { node, trigger } => {
                write!(f, "node {node} has no trigger output {trigger}")
            }
            Self::DuplicateTriggerRoute { node, trigger } => {
                write!(f, "trigger output {trigger} of node {node} is wired twice")
            }
        }
    }
}

impl std::error::Error for TopologyError {}

/// Exact byte cost of the four host memory regions, as reported by
/// [`measure`]. A pure function of description + settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphFootprint {
    /// The compiled graph block: every pool except the three below.
    pub graph_bytes: usize,
    /// The per-batch scratch sample arena.
    pub scratch_bytes: usize,
    /// The trigger event queues.
    pub trigger_bytes: usize,
    /// The per-node context-memory region.
    pub context_bytes: usize,
}

/// Measures the memory a compiled graph will need.
///
/// Rejects malformed topologies; identical inputs always yield identical
/// sizes.
pub fn measure(
    desc: &GraphDescription,
    settings: &RuntimeSettings,
) -> Result<GraphFootprint, TopologyError> {
    PoolPlan::new(desc, settings).map(|plan| plan.footprint())
}

/// Element counts for every pool, computed in one validated traversal and
/// shared verbatim by [`measure`], [`GraphMemory::allocate`] and the builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PoolPlan {
    pub node_count: usize,
    pub external_count: usize,
    pub param_count: usize,
    pub resource_count: usize,
    pub input_count: usize,
    /// Sentinel + externals + every node output socket.
    pub output_count: usize,
    pub dep_count: usize,
    pub route_count: usize,
    pub queue_event_count: usize,
    pub context_bytes: usize,
    pub scratch_samples: usize,
}

impl PoolPlan {
    pub(crate) fn new(
        desc: &GraphDescription,
        settings: &RuntimeSettings,
    ) -> Result<Self, TopologyError> {
        validate_topology(desc)?;

        let mut plan = Self {
            node_count: desc.nodes.len(),
            external_count: desc.externals.len(),
            param_count: 0,
            resource_count: 0,
            input_count: 0,
            output_count: 1 + desc.externals.len(),
            dep_count: 0,
            route_count: 0,
            queue_event_count: 0,
            context_bytes: 0,
            scratch_samples: 0,
        };

        let mut alloc_channels: usize = desc.externals.iter().map(|e| e.channels as usize).sum();

        for (i, instance) in desc.nodes.iter().enumerate() {
            let spec = instance.spec;
            plan.param_count += spec.params.len();
            plan.resource_count += spec.resources as usize;
            plan.input_count += spec.audio_inputs as usize;
            plan.output_count += spec.audio_outputs.len();
            plan.route_count += spec.trigger_outputs.len();
            if !spec.trigger_inputs.is_empty() {
                plan.queue_event_count += settings.max_trigger_events as usize;
            }
            instance.visit_dependencies(|_| plan.dep_count += 1);

            let runtime = (spec.runtime)(settings);
            plan.context_bytes += runtime.context_bytes as usize;

            for output in 0..spec.audio_outputs.len() {
                alloc_channels +=
                    resolve::allocated_channels(desc, i as NodeIndex, output as SocketIndex)?
                        as usize;
            }
        }

        plan.scratch_samples = alloc_channels * settings.max_batch_frames as usize;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            nodes = plan.node_count,
            params = plan.param_count,
            sockets = plan.output_count,
            scratch_samples = plan.scratch_samples,
            "graph_measure"
        );

        Ok(plan)
    }

    /// Byte sizes of the four regions, with each graph sub-pool rounded to
    /// the next pool's element alignment.
    pub(crate) fn footprint(&self) -> GraphFootprint {
        use core::mem::{align_of, size_of};

        let mut graph_bytes = 0usize;
        graph_bytes += align_up(
            self.param_count * size_of::<f32>(),
            align_of::<Option<Resource>>(),
        );
        graph_bytes += align_up(
            self.resource_count * size_of::<Option<Resource>>(),
            align_of::<NodeRecord>(),
        );
        graph_bytes += align_up(
            self.node_count * size_of::<NodeRecord>(),
            align_of::<OutputSlot>(),
        );
        graph_bytes += align_up(
            self.input_count * size_of::<OutputSlot>(),
            align_of::<OutputSocket>(),
        );
        graph_bytes += align_up(
            self.output_count * size_of::<OutputSocket>(),
            align_of::<TriggerRoute>(),
        );
        graph_bytes += align_up(
            self.route_count * size_of::<TriggerRoute>(),
            align_of::<NodeIndex>(),
        );
        graph_bytes += align_up(
            self.dep_count * size_of::<NodeIndex>(),
            align_of::<f32>(),
        );

        GraphFootprint {
            graph_bytes,
            scratch_bytes: self.scratch_samples * size_of::<f32>(),
            trigger_bytes: self.queue_event_count * size_of::<TriggerIndex>(),
            context_bytes: self.context_bytes,
        }
    }
}

fn align_up(size: usize, align: usize) -> usize {
    (size + align - 1) & !(align - 1)
}

fn validate_topology(desc: &GraphDescription) -> Result<(), TopologyError> {
    if desc.nodes.len() > NodeIndex::MAX as usize {
        return Err(TopologyError::TooManyNodes {
            count: desc.nodes.len(),
        });
    }
    if desc.externals.len() > SocketIndex::MAX as usize {
        return Err(TopologyError::TooManyExternals {
            count: desc.externals.len(),
        });
    }

    for (i, instance) in desc.nodes.iter().enumerate() {
        let consumer = i as NodeIndex;
        let spec = instance.spec;

        for (c, conn) in instance.audio_connections.iter().enumerate() {
            if conn.input >= spec.audio_inputs {
                return Err(TopologyError::InvalidInputSocket {
                    node: consumer,
                    input: conn.input,
                });
            }
            if instance.audio_connections[..c]
                .iter()
                .any(|prev| prev.input == conn.input)
            {
                return Err(TopologyError::DuplicateFanIn {
                    node: consumer,
                    input: conn.input,
                });
            }
            match conn.source {
                crate::description::SourceSocket::External(external) => {
                    if external as usize >= desc.externals.len() {
                        return Err(TopologyError::InvalidExternalInput {
                            node: consumer,
                            external,
                        });
                    }
                }
                crate::description::SourceSocket::Node { node, output } => {
                    if node as usize >= i {
                        return Err(TopologyError::FeedForwardViolation {
                            producer: node,
                            consumer,
                        });
                    }
                    if output as usize >= desc.nodes[node as usize].spec.audio_outputs.len() {
                        return Err(TopologyError::InvalidOutputSocket { node, output });
                    }
                }
            }
        }

        for (t, conn) in instance.trigger_connections.iter().enumerate() {
            if conn.input as usize >= spec.trigger_inputs.len() {
                return Err(TopologyError::InvalidTriggerInput {
                    node: consumer,
                    trigger: conn.input,
                });
            }
            let Some(source) = desc.nodes.get(conn.source_node as usize) else {
                return Err(TopologyError::InvalidTriggerOutput {
                    node: conn.source_node,
                    trigger: conn.source_output,
                });
            };
            if conn.source_output as usize >= source.spec.trigger_outputs.len() {
                return Err(TopologyError::InvalidTriggerOutput {
                    node: conn.source_node,
                    trigger: conn.source_output,
                });
            }
            let claims = |other: &crate::description::TriggerConnection| {
                other.source_node == conn.source_node
                    && other.source_output == conn.source_output
            };
            let claimed = instance.trigger_connections[..t].iter().any(claims)
                || desc.nodes[..i]
                    .iter()
                    .any(|n| n.trigger_connections.iter().any(claims));
            if claimed {
                return Err(TopologyError::DuplicateTriggerRoute {
                    node: conn.source_node,
                    trigger: conn.source_output,
                });
            }
        }
    }

    Ok(())
}

/// The host memory seam: every pool a compiled graph uses, pre-sized exactly
/// per the plan. Allocated once here; build and render never allocate.
pub struct GraphMemory {
    pub(crate) plan: PoolPlan,
    pub(crate) params: Vec<f32>,
    pub(crate) resources: Vec<Option<Resource>>,
    pub(crate) records: Vec<NodeRecord>,
    pub(crate) input_slots: Vec<OutputSlot>,
    pub(crate) sockets: Vec<OutputSocket>,
    pub(crate) deps: Vec<NodeIndex>,
    pub(crate) routes: Vec<TriggerRoute>,
    pub(crate) trigger_events: Vec<TriggerIndex>,
    pub(crate) context: Vec<u8>,
    pub(crate) arena: ScratchArena,
    pub(crate) rendered: Vec<bool>,
}

impl GraphMemory {
    /// Measures the description and allocates every pool to its exact size.
    pub fn allocate(
        desc: &GraphDescription,
        settings: &RuntimeSettings,
    ) -> Result<Self, TopologyError> {
        let plan = PoolPlan::new(desc, settings)?;
        Ok(Self {
            plan,
            params: Vec::with_capacity(plan.param_count),
            resources: Vec::with_capacity(plan.resource_count),
            records: Vec::with_capacity(plan.node_count),
            input_slots: Vec::with_capacity(plan.input_count),
            sockets: Vec::with_capacity(plan.output_count),
            deps: Vec::with_capacity(plan.dep_count),
            routes: Vec::with_capacity(plan.route_count),
            trigger_events: vec![0; plan.queue_event_count],
            context: vec![0; plan.context_bytes],
            arena: ScratchArena::new(plan.scratch_samples),
            rendered: vec![false; plan.node_count],
        })
    }

    /// The byte cost of this allocation, identical to [`measure`]'s report.
    pub fn footprint(&self) -> GraphFootprint {
        self.plan.footprint()
    }
}
