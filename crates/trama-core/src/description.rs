//! Static node specifications and host-authored graph descriptions.
//!
//! A [`NodeSpec`] describes a node *type*: its socket counts, parameter
//! defaults, and a factory that resolves runtime settings into the callbacks
//! and context-memory size the executor needs. Specs are `&'static`: the
//! builtin set lives in the `trama-nodes` crate and is looked up through the
//! `trama-registry` catalog.
//!
//! A [`GraphDescription`] is the host-authored topology: an ordered list of
//! [`NodeInstance`]s plus declared external audio inputs. Audio connections
//! reference producers by absolute index and must satisfy the feed-forward
//! invariant (producer index strictly below consumer index), which guarantees
//! acyclic single-pass evaluation. Trigger connections carry no ordering
//! constraint — an event fired at an earlier node is simply delivered on the
//! next batch.

use crate::render::RenderScope;

/// Index of a node within a graph description (declaration order).
pub type NodeIndex = u16;
/// Index of an audio socket within one node.
pub type SocketIndex = u8;
/// Index of a parameter within one node.
pub type ParamIndex = u8;
/// Index of a trigger socket within one node.
pub type TriggerIndex = u8;
/// Index of a resource slot within one node.
pub type ResourceIndex = u8;

/// Graph-wide runtime settings, fixed for the lifetime of a compiled graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// Sample rate in frames per second.
    pub sample_rate: u32,
    /// Upper bound on `frames` per render call. Sizes the scratch arena.
    pub max_batch_frames: u32,
    /// Capacity of each node's trigger-input queue, per batch.
    pub max_trigger_events: u16,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            max_batch_frames: 256,
            max_trigger_events: 32,
        }
    }
}

/// How an audio output socket obtains its buffer each batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputAlloc {
    /// The node allocates a fresh buffer with this many channels.
    Fixed(u8),
    /// The node steals the buffer arriving at the given input socket.
    /// Contributes no scratch bytes of its own.
    PassThrough(SocketIndex),
    /// The node allocates a fresh buffer with the same channel count as the
    /// given input socket, then fills it (always a copy, never an alias).
    AsInput(SocketIndex),
}

/// One parameter of a node type: optional name (for the access layer) and
/// the default value copied into the parameter pool at build time.
///
/// Unnamed parameters are the conventional home for per-instance smoothing
/// state that must survive between batches.
#[derive(Clone, Copy, Debug)]
pub struct ParamSpec {
    /// Name exposed to the access layer, or `None` for hidden state slots.
    pub name: Option<&'static str>,
    /// Initial value.
    pub default: f32,
}

/// One trigger socket of a node type.
#[derive(Clone, Copy, Debug)]
pub struct TriggerSpec {
    /// Name exposed to the access layer, or `None`.
    pub name: Option<&'static str>,
}

/// Render callback: one batch of work against a [`RenderScope`] view.
///
/// Callbacks must not allocate, block, or run work unbounded relative to the
/// batch frame count. All per-instance state lives in the parameter pool or
/// the node's context bytes.
pub type RenderFn = fn(&mut RenderScope<'_>);

/// One-time setup callback, run at build with the node's context bytes.
pub type InitFn = fn(&RuntimeSettings, &mut [u8]);

/// Runtime half of a node type, resolved from [`RuntimeSettings`] once at
/// measure/build time.
#[derive(Clone, Copy)]
pub struct NodeRuntime {
    /// Per-batch render callback.
    pub render: RenderFn,
    /// Optional one-time init callback.
    pub init: Option<InitFn>,
    /// Context-memory bytes this node type needs per instance.
    pub context_bytes: u32,
}

/// Immutable description of a node type. Shared by every instance.
pub struct NodeSpec {
    /// Stable identifier, also used as the catalog key.
    pub id: &'static str,
    /// Number of audio input sockets.
    pub audio_inputs: SocketIndex,
    /// Allocation mode per audio output socket.
    pub audio_outputs: &'static [OutputAlloc],
    /// Parameters, named and hidden.
    pub params: &'static [ParamSpec],
    /// Number of resource slots.
    pub resources: ResourceIndex,
    /// Trigger input sockets.
    pub trigger_inputs: &'static [TriggerSpec],
    /// Trigger output sockets.
    pub trigger_outputs: &'static [TriggerSpec],
    /// Factory resolving runtime settings into callbacks + context size.
    /// Must be a pure function of the settings.
    pub runtime: fn(&RuntimeSettings) -> NodeRuntime,
}

impl core::fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeSpec")
            .field("id", &self.id)
            .field("audio_inputs", &self.audio_inputs)
            .field("audio_outputs", &self.audio_outputs)
            .finish_non_exhaustive()
    }
}

/// The producer side of an audio connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceSocket {
    /// One of the graph's declared external audio inputs.
    External(SocketIndex),
    /// An output socket of an earlier node in declaration order.
    Node {
        /// Producer node index. Must be strictly below the consumer's index.
        node: NodeIndex,
        /// Output socket on the producer.
        output: SocketIndex,
    },
}

/// Wires one audio input socket of the declaring node to a producer socket.
#[derive(Clone, Copy, Debug)]
pub struct AudioConnection {
    /// Input socket on the declaring (consuming) node.
    pub input: SocketIndex,
    /// Producer socket.
    pub source: SourceSocket,
}

/// Wires one trigger input socket of the declaring node to a trigger output
/// of any node in the graph (no ordering constraint).
#[derive(Clone, Copy, Debug)]
pub struct TriggerConnection {
    /// Trigger input socket on the declaring node.
    pub input: TriggerIndex,
    /// Node owning the firing trigger output.
    pub source_node: NodeIndex,
    /// Trigger output socket on the source node.
    pub source_output: TriggerIndex,
}

/// One node instance in a graph description.
pub struct NodeInstance {
    /// The node type.
    pub spec: &'static NodeSpec,
    /// Instance name for the access layer, or `None` to stay unaddressable.
    pub name: Option<String>,
    /// Audio connections into this node's input sockets.
    pub audio_connections: Vec<AudioConnection>,
    /// Trigger connections into this node's trigger input sockets.
    pub trigger_connections: Vec<TriggerConnection>,
}

impl NodeInstance {
    /// Creates an unnamed, unconnected instance of a node type.
    pub fn new(spec: &'static NodeSpec) -> Self {
        Self {
            spec,
            name: None,
            audio_connections: Vec::new(),
            trigger_connections: Vec::new(),
        }
    }

    /// Sets the instance name used by the access layer.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Wires `input` to an output socket of an earlier node.
    pub fn audio_from(mut self, input: SocketIndex, node: NodeIndex, output: SocketIndex) -> Self {
        self.audio_connections.push(AudioConnection {
            input,
            source: SourceSocket::Node { node, output },
        });
        self
    }

    /// Wires `input` to a declared external audio input.
    pub fn audio_from_external(mut self, input: SocketIndex, external: SocketIndex) -> Self {
        self.audio_connections.push(AudioConnection {
            input,
            source: SourceSocket::External(external),
        });
        self
    }

    /// Wires trigger `input` to a trigger output of `source_node`.
    pub fn trigger_from(
        mut self,
        input: TriggerIndex,
        source_node: NodeIndex,
        source_output: TriggerIndex,
    ) -> Self {
        self.trigger_connections.push(TriggerConnection {
            input,
            source_node,
            source_output,
        });
        self
    }

    /// Visits this node's internal audio producers, deduplicated in
    /// first-reference order. Shared by the layout planner and the builder so
    /// dependency counts always agree between the two passes.
    pub(crate) fn visit_dependencies(&self, mut f: impl FnMut(NodeIndex)) {
        for (i, conn) in self.audio_connections.iter().enumerate() {
            let SourceSocket::Node { node, .. } = conn.source else {
                continue;
            };
            let seen = self.audio_connections[..i].iter().any(
                |prev| matches!(prev.source, SourceSocket::Node { node: p, .. } if p == node),
            );
            if !seen {
                f(node);
            }
        }
    }
}

/// A declared external audio input: the host feeds its samples per batch.
#[derive(Clone, Copy, Debug)]
pub struct ExternalInput {
    /// Channel count of the buffer the host will supply.
    pub channels: u8,
}

/// Host-authored description of a complete graph topology.
///
/// Read-only to the compiler. Invariant: every audio connection's producer
/// precedes its consumer in `nodes` (validated by the layout planner).
#[derive(Default)]
pub struct GraphDescription {
    /// Node instances in declaration (= evaluation) order.
    pub nodes: Vec<NodeInstance>,
    /// Declared external audio inputs.
    pub externals: Vec<ExternalInput>,
}

impl GraphDescription {
    /// Creates an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an external audio input, returning its index.
    pub fn add_external(&mut self, channels: u8) -> SocketIndex {
        self.externals.push(ExternalInput { channels });
        (self.externals.len() - 1) as SocketIndex
    }

    /// Appends a node instance, returning its index.
    pub fn add_node(&mut self, instance: NodeInstance) -> NodeIndex {
        self.nodes.push(instance);
        (self.nodes.len() - 1) as NodeIndex
    }
}
