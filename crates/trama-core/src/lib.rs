//! Trama Core — static sound-graph compiler and batch render executor.
//!
//! A host (game engine, audio middleware) describes a signal-processing
//! topology once — nodes with typed sockets, wired feed-forward — and this
//! crate compiles it into one flat, pre-sized runtime block that renders a
//! fixed-size batch per callback with no dynamic allocation and bounded
//! latency.
//!
//! # Pipeline
//!
//! 1. **Describe** — build a [`GraphDescription`]: node instances over
//!    `&'static` [`NodeSpec`]s, audio connections (producer index strictly
//!    before consumer: the feed-forward invariant), trigger connections,
//!    declared external inputs.
//! 2. **Measure** — [`measure`] validates the topology and reports the exact
//!    byte cost of every region; [`GraphMemory::allocate`] performs the only
//!    allocations in the system.
//! 3. **Build** — [`CompiledGraph::build`] carves the pools, copies parameter
//!    defaults, wires sockets, stamps resolved channel counts and runs init
//!    callbacks. All-or-nothing: on error no graph is returned.
//! 4. **Render** — [`CompiledGraph::render`] (declaration order) or
//!    [`render_dependency_ordered`](CompiledGraph::render_dependency_ordered)
//!    once per batch. [`CompiledGraph::jobs`] exposes the dependency-annotated
//!    job list for an external parallel task scheduler.
//!
//! # Buffer ownership
//!
//! Audio buffers live in a per-batch bump [`ScratchArena`]. An output socket
//! holds `Option<BufferId>`; a consumer that reuses its input in place
//! *steals* the buffer ([`RenderScope::steal_input`] takes it out of the
//! producer's socket), and a node that needs storage allocates fresh
//! ([`RenderScope::alloc`], `None` on exhaustion ⇒ emit silence). Every
//! buffer has exactly one owner at any time.
//!
//! # Example
//!
//! ```rust,ignore
//! use trama_core::{CompiledGraph, GraphDescription, GraphMemory, NodeInstance, RuntimeSettings};
//! use trama_nodes::{DC, GAIN};
//!
//! let mut desc = GraphDescription::new();
//! let dc = desc.add_node(NodeInstance::new(&DC).named("level"));
//! desc.add_node(NodeInstance::new(&GAIN).audio_from(0, dc, 0));
//!
//! let settings = RuntimeSettings::default();
//! let memory = GraphMemory::allocate(&desc, &settings)?;
//! let mut graph = CompiledGraph::build(&desc, settings, memory)?;
//!
//! graph.render(256, &[])?;
//! let samples = graph.output_samples(1, 0);
//! ```
//!
//! # Concurrency model
//!
//! Compilation is single-threaded and runs once. Sequential rendering is
//! deterministic and single-threaded. Dependency mode only *annotates* jobs;
//! parallel execution belongs to an external scheduler. There is no internal
//! locking: each batch assigns every pool slice to exactly one node.

pub mod access;
pub mod build;
pub mod description;
pub mod graph;
pub mod plan;
pub mod render;
mod resolve;
pub mod scratch;
pub mod trigger;

pub use access::{GraphAccess, node_name_hash, parameter_hash, trigger_hash};
pub use build::{BuildError, WiringError};
pub use description::{
    AudioConnection, ExternalInput, GraphDescription, InitFn, NodeIndex, NodeInstance,
    NodeRuntime, NodeSpec, OutputAlloc, ParamIndex, ParamSpec, RenderFn, ResourceIndex,
    RuntimeSettings, SocketIndex, SourceSocket, TriggerConnection, TriggerIndex, TriggerSpec,
};
pub use graph::{CompiledGraph, RenderJob, Resource};
pub use plan::{GraphFootprint, GraphMemory, TopologyError, measure};
pub use render::{RenderError, RenderScope};
pub use scratch::{AudioBuffer, BufferId, ScratchArena};
pub use trigger::FireError;
