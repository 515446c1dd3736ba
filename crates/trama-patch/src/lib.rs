//! Patch builder: assemble validated [`GraphDescription`]s by catalog id.
//!
//! [`GraphBuilder`] wraps a [`NodeCatalog`] and catches wiring mistakes at
//! patch-assembly time — unknown ids, bad sockets, backwards wires, double
//! fan-in — with errors that name the offending node, instead of deferring
//! everything to the compiler's measure pass.
//!
//! # Example
//!
//! ```rust
//! use trama_patch::GraphBuilder;
//! use trama_registry::NodeCatalog;
//!
//! let catalog = NodeCatalog::new();
//! let mut builder = GraphBuilder::new(&catalog);
//! let osc = builder.add_named("sine", "voice").unwrap();
//! let gain = builder.add("gain").unwrap();
//! builder.wire(osc, 0, gain, 0).unwrap();
//! let description = builder.finish();
//! assert_eq!(description.nodes.len(), 2);
//! ```

use thiserror::Error;
use trama_core::{
    GraphDescription, NodeIndex, NodeInstance, SocketIndex, SourceSocket, TriggerIndex,
};
use trama_registry::NodeCatalog;

/// A patch-assembly mistake, caught before the description reaches the
/// compiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The catalog has no node type with this id.
    #[error("unknown node id `{0}`")]
    UnknownNode(String),
    /// A node index from another builder, or out of range.
    #[error("node {node} does not exist")]
    NoSuchNode {
        /// Offending index.
        node: NodeIndex,
    },
    /// The producer has no such audio output.
    #[error("node {node} has no audio output {output}")]
    NoSuchOutput {
        /// Producer node.
        node: NodeIndex,
        /// Offending output socket.
        output: SocketIndex,
    },
    /// The consumer has no such audio input.
    #[error("node {node} has no audio input {input}")]
    NoSuchInput {
        /// Consumer node.
        node: NodeIndex,
        /// Offending input socket.
        input: SocketIndex,
    },
    /// The consumer input is already wired.
    #[error("audio input {input} of node {node} is already wired")]
    InputTaken {
        /// Consumer node.
        node: NodeIndex,
        /// Input socket wired twice.
        input: SocketIndex,
    },
    /// Producers must be declared before their consumers.
    #[error("producer {producer} must precede consumer {consumer}")]
    BackwardsWire {
        /// Producer node.
        producer: NodeIndex,
        /// Consumer node.
        consumer: NodeIndex,
    },
    /// No external input with this index was declared.
    #[error("external input {external} is not declared")]
    NoSuchExternal {
        /// Offending external index.
        external: SocketIndex,
    },
    /// The destination has no such trigger input.
    #[error("node {node} has no trigger input {trigger}")]
    NoSuchTriggerInput {
        /// Destination node.
        node: NodeIndex,
        /// Offending trigger input.
        trigger: TriggerIndex,
    },
    /// The source has no such trigger output.
    #[error("node {node} has no trigger output {trigger}")]
    NoSuchTriggerOutput {
        /// Source node.
        node: NodeIndex,
        /// Offending trigger output.
        trigger: TriggerIndex,
    },
    /// The source trigger output is already routed somewhere.
    #[error("trigger output {trigger} of node {node} is already routed")]
    TriggerOutputTaken {
        /// Source node.
        node: NodeIndex,
        /// Trigger output routed twice.
        trigger: TriggerIndex,
    },
}

/// Incremental, validated construction of a [`GraphDescription`].
pub struct GraphBuilder<'c> {
    catalog: &'c NodeCatalog,
    description: GraphDescription,
}

impl<'c> GraphBuilder<'c> {
    /// Starts an empty patch over a catalog.
    pub fn new(catalog: &'c NodeCatalog) -> Self {
        Self {
            catalog,
            description: GraphDescription::new(),
        }
    }

    /// Declares an external audio input the host will feed per batch.
    pub fn external(&mut self, channels: u8) -> SocketIndex {
        self.description.add_external(channels)
    }

    /// Appends an unnamed node by catalog id.
    pub fn add(&mut self, id: &str) -> Result<NodeIndex, PatchError> {
        let spec = self
            .catalog
            .spec(id)
            .ok_or_else(|| PatchError::UnknownNode(id.to_owned()))?;
        let node = self.description.add_node(NodeInstance::new(spec));
        tracing::debug!(id, node, "patch_add");
        Ok(node)
    }

    /// Appends a node by catalog id with an access-layer name.
    pub fn add_named(&mut self, id: &str, name: &str) -> Result<NodeIndex, PatchError> {
        let spec = self
            .catalog
            .spec(id)
            .ok_or_else(|| PatchError::UnknownNode(id.to_owned()))?;
        let node = self
            .description
            .add_node(NodeInstance::new(spec).named(name));
        tracing::debug!(id, name, node, "patch_add");
        Ok(node)
    }

    /// Appends a linear chain of nodes, wiring output 0 → input 0 between
    /// neighbours. Returns the node indices in chain order.
    pub fn chain(&mut self, ids: &[&str]) -> Result<Vec<NodeIndex>, PatchError> {
        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            let node = self.add(id)?;
            if let Some(&prev) = nodes.last() {
                self.wire(prev, 0, node, 0)?;
            }
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Wires a producer output to a consumer input.
    pub fn wire(
        &mut self,
        producer: NodeIndex,
        output: SocketIndex,
        consumer: NodeIndex,
        input: SocketIndex,
    ) -> Result<(), PatchError> {
        if producer >= consumer {
            return Err(PatchError::BackwardsWire { producer, consumer });
        }
        let producer_spec = self.node(producer)?.spec;
        if output as usize >= producer_spec.audio_outputs.len() {
            return Err(PatchError::NoSuchOutput {
                node: producer,
                output,
            });
        }
        self.claim_input(consumer, input)?;
        self.description.nodes[consumer as usize]
            .audio_connections
            .push(trama_core::AudioConnection {
                input,
                source: SourceSocket::Node {
                    node: producer,
                    output,
                },
            });
        tracing::debug!(producer, output, consumer, input, "patch_wire");
        Ok(())
    }

    /// Wires a declared external input to a consumer input.
    pub fn wire_external(
        &mut self,
        external: SocketIndex,
        consumer: NodeIndex,
        input: SocketIndex,
    ) -> Result<(), PatchError> {
        if external as usize >= self.description.externals.len() {
            return Err(PatchError::NoSuchExternal { external });
        }
        self.claim_input(consumer, input)?;
        self.description.nodes[consumer as usize]
            .audio_connections
            .push(trama_core::AudioConnection {
                input,
                source: SourceSocket::External(external),
            });
        tracing::debug!(external, consumer, input, "patch_wire_external");
        Ok(())
    }

    /// Routes a trigger output to a trigger input anywhere in the patch.
    pub fn route_trigger(
        &mut self,
        source: NodeIndex,
        output: TriggerIndex,
        dest: NodeIndex,
        input: TriggerIndex,
    ) -> Result<(), PatchError> {
        let source_spec = self.node(source)?.spec;
        if output as usize >= source_spec.trigger_outputs.len() {
            return Err(PatchError::NoSuchTriggerOutput {
                node: source,
                trigger: output,
            });
        }
        let dest_spec = self.node(dest)?.spec;
        if input as usize >= dest_spec.trigger_inputs.len() {
            return Err(PatchError::NoSuchTriggerInput {
                node: dest,
                trigger: input,
            });
        }
        let taken = self.description.nodes.iter().any(|n| {
            n.trigger_connections
                .iter()
                .any(|c| c.source_node == source && c.source_output == output)
        });
        if taken {
            return Err(PatchError::TriggerOutputTaken {
                node: source,
                trigger: output,
            });
        }
        self.description.nodes[dest as usize]
            .trigger_connections
            .push(trama_core::TriggerConnection {
                input,
                source_node: source,
                source_output: output,
            });
        tracing::debug!(source, output, dest, input, "patch_route_trigger");
        Ok(())
    }

    /// Finishes the patch, yielding the description for `measure`/`build`.
    pub fn finish(self) -> GraphDescription {
        self.description
    }

    fn node(&self, node: NodeIndex) -> Result<&NodeInstance, PatchError> {
        self.description
            .nodes
            .get(node as usize)
            .ok_or(PatchError::NoSuchNode { node })
    }

    fn claim_input(&mut self, consumer: NodeIndex, input: SocketIndex) -> Result<(), PatchError> {
        let instance = self.node(consumer)?;
        if input >= instance.spec.audio_inputs {
            return Err(PatchError::NoSuchInput {
                node: consumer,
                input,
            });
        }
        if instance.audio_connections.iter().any(|c| c.input == input) {
            return Err(PatchError::InputTaken {
                node: consumer,
                input,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trama_core::{CompiledGraph, GraphMemory, RuntimeSettings};

    fn catalog() -> NodeCatalog {
        NodeCatalog::new()
    }

    #[test]
    fn chain_builds_and_compiles() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        let nodes = builder.chain(&["dc", "gain", "to_stereo"]).unwrap();
        assert_eq!(nodes, vec![0, 1, 2]);

        let desc = builder.finish();
        let settings = RuntimeSettings::default();
        let memory = GraphMemory::allocate(&desc, &settings).unwrap();
        let mut graph = CompiledGraph::build(&desc, settings, memory).unwrap();
        graph.render(128, &[]).unwrap();
        assert_eq!(graph.output_channels(2, 0), Some(2));
    }

    #[test]
    fn unknown_id_is_rejected() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        assert_eq!(
            builder.add("reverb"),
            Err(PatchError::UnknownNode("reverb".into()))
        );
    }

    #[test]
    fn backwards_wire_is_rejected() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        let dc = builder.add("dc").unwrap();
        let gain = builder.add("gain").unwrap();
        assert_eq!(
            builder.wire(gain, 0, dc, 0),
            Err(PatchError::BackwardsWire {
                producer: gain,
                consumer: dc
            })
        );
    }

    #[test]
    fn double_fan_in_is_rejected() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        let a = builder.add("dc").unwrap();
        let b = builder.add("dc").unwrap();
        let gain = builder.add("gain").unwrap();
        builder.wire(a, 0, gain, 0).unwrap();
        assert_eq!(
            builder.wire(b, 0, gain, 0),
            Err(PatchError::InputTaken {
                node: gain,
                input: 0
            })
        );
    }

    #[test]
    fn trigger_routing_validates_sockets() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        let pulse = builder.add("pulse").unwrap();
        let sine = builder.add("sine").unwrap();
        builder.route_trigger(pulse, 0, sine, 0).unwrap();
        // The pulse's only output is now taken.
        assert_eq!(
            builder.route_trigger(pulse, 0, sine, 1),
            Err(PatchError::TriggerOutputTaken {
                node: pulse,
                trigger: 0
            })
        );
        // The gain node has no trigger sockets at all.
        let gain = builder.add("gain").unwrap();
        assert_eq!(
            builder.route_trigger(gain, 0, sine, 0),
            Err(PatchError::NoSuchTriggerOutput {
                node: gain,
                trigger: 0
            })
        );
    }

    #[test]
    fn external_wiring_checks_declaration() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        let gain = builder.add("gain").unwrap();
        assert_eq!(
            builder.wire_external(0, gain, 0),
            Err(PatchError::NoSuchExternal { external: 0 })
        );
        let ext = builder.external(2);
        builder.wire_external(ext, gain, 0).unwrap();
    }
}
