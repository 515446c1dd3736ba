//! Node catalog for trama sound graphs.
//!
//! The catalog is the discovery surface over the builtin
//! [`NodeSpec`](trama_core::NodeSpec) set: list nodes with metadata, filter
//! by category, and resolve a spec by its stable id. Graph-building layers
//! (see `trama-patch`) look specs up here instead of importing node statics
//! directly, so data-driven hosts can address nodes by name.
//!
//! # Example
//!
//! ```rust
//! use trama_registry::{NodeCatalog, NodeCategory};
//!
//! let catalog = NodeCatalog::new();
//! for node in catalog.all_nodes() {
//!     println!("{}: {}", node.id, node.description);
//! }
//! let sine = catalog.spec("sine").unwrap();
//! assert_eq!(sine.audio_outputs.len(), 1);
//! ```

use trama_core::NodeSpec;
use trama_nodes::{DC, GAIN, MERGE, PULSE, SAMPLER, SINE, SPLIT, TO_STEREO};

/// Coarse grouping of node types for browsing UIs and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Signal sources (oscillators, constants, sample playback).
    Generator,
    /// Level and shaping utilities.
    Utility,
    /// Fan-out / fan-in and channel-layout plumbing.
    Routing,
    /// Trigger-event sources and clocks.
    Event,
}

impl NodeCategory {
    /// Human-readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeCategory::Generator => "Generator",
            NodeCategory::Utility => "Utility",
            NodeCategory::Routing => "Routing",
            NodeCategory::Event => "Event",
        }
    }
}

/// Metadata describing one catalog entry.
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    /// Stable identifier (matches `NodeSpec::id`).
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description.
    pub description: &'static str,
    /// Category for organization.
    pub category: NodeCategory,
}

struct CatalogEntry {
    descriptor: NodeDescriptor,
    spec: &'static NodeSpec,
}

/// Registry of all available node types.
pub struct NodeCatalog {
    entries: Vec<CatalogEntry>,
}

impl Default for NodeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeCatalog {
    /// Creates a catalog with every builtin node registered.
    pub fn new() -> Self {
        let mut catalog = Self {
            entries: Vec::with_capacity(8),
        };
        catalog.register_builtin_nodes();
        catalog
    }

    fn register_builtin_nodes(&mut self) {
        self.register(
            NodeDescriptor {
                id: "dc",
                name: "DC",
                description: "Constant level source",
                category: NodeCategory::Generator,
            },
            &DC,
        );
        self.register(
            NodeDescriptor {
                id: "sine",
                name: "Sine",
                description: "Sine oscillator with Start/Stop gate",
                category: NodeCategory::Generator,
            },
            &SINE,
        );
        self.register(
            NodeDescriptor {
                id: "sampler",
                name: "Sampler",
                description: "One-shot clip player over a resource slot",
                category: NodeCategory::Generator,
            },
            &SAMPLER,
        );
        self.register(
            NodeDescriptor {
                id: "gain",
                name: "Gain",
                description: "Ramped gain applied in place",
                category: NodeCategory::Utility,
            },
            &GAIN,
        );
        self.register(
            NodeDescriptor {
                id: "to_stereo",
                name: "To Stereo",
                description: "Mono to stereo duplication",
                category: NodeCategory::Routing,
            },
            &TO_STEREO,
        );
        self.register(
            NodeDescriptor {
                id: "split",
                name: "Split",
                description: "Fan-out into two branches",
                category: NodeCategory::Routing,
            },
            &SPLIT,
        );
        self.register(
            NodeDescriptor {
                id: "merge",
                name: "Merge",
                description: "Fan-in summing two branches",
                category: NodeCategory::Routing,
            },
            &MERGE,
        );
        self.register(
            NodeDescriptor {
                id: "pulse",
                name: "Pulse",
                description: "Interval clock firing a Tick trigger",
                category: NodeCategory::Event,
            },
            &PULSE,
        );
    }

    /// Registers a node type. Later registrations with an existing id win,
    /// allowing hosts to shadow builtins.
    pub fn register(&mut self, descriptor: NodeDescriptor, spec: &'static NodeSpec) {
        debug_assert_eq!(descriptor.id, spec.id, "descriptor id must match spec id");
        self.entries.push(CatalogEntry { descriptor, spec });
    }

    /// Resolves a node spec by id.
    pub fn spec(&self, id: &str) -> Option<&'static NodeSpec> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.descriptor.id == id)
            .map(|entry| entry.spec)
    }

    /// Descriptor metadata for an id.
    pub fn descriptor(&self, id: &str) -> Option<&NodeDescriptor> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.descriptor.id == id)
            .map(|entry| &entry.descriptor)
    }

    /// All registered descriptors, in registration order.
    pub fn all_nodes(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.entries.iter().map(|entry| &entry.descriptor)
    }

    /// Descriptors in one category.
    pub fn nodes_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeDescriptor> {
        self.entries
            .iter()
            .map(|entry| &entry.descriptor)
            .filter(move |d| d.category == category)
    }

    /// Number of registered node types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no node types are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_resolve() {
        let catalog = NodeCatalog::new();
        for id in ["dc", "gain", "sine", "to_stereo", "split", "merge", "pulse", "sampler"] {
            assert!(catalog.spec(id).is_some(), "missing {id}");
            assert_eq!(catalog.spec(id).unwrap().id, id);
        }
        assert!(catalog.spec("nope").is_none());
        assert_eq!(catalog.len(), 8);
    }

    #[test]
    fn categories_partition_the_set() {
        let catalog = NodeCatalog::new();
        let generators: Vec<_> = catalog.nodes_in_category(NodeCategory::Generator).collect();
        assert_eq!(generators.len(), 3);
        let events: Vec<_> = catalog.nodes_in_category(NodeCategory::Event).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "pulse");
    }

    #[test]
    fn later_registration_shadows() {
        let mut catalog = NodeCatalog::new();
        catalog.register(
            NodeDescriptor {
                id: "dc",
                name: "DC (host)",
                description: "Shadowed",
                category: NodeCategory::Utility,
            },
            &trama_nodes::DC,
        );
        assert_eq!(catalog.descriptor("dc").unwrap().name, "DC (host)");
    }
}
