//! Name-based parameter and trigger access, off the render hot path.
//!
//! [`GraphAccess`] maps 32-bit name hashes to `(node, socket)` index pairs
//! for every *named* node instance, then delegates to the raw index APIs on
//! [`CompiledGraph`]. Hosts precompute hashes with [`parameter_hash`] /
//! [`trigger_hash`] (typically at asset-bake time) and never touch strings
//! while the graph is live.
//!
//! The hash is XXH32: a parameter or trigger name hashed with the node-name
//! hash as seed. Collisions are not detected — an accepted tradeoff for a
//! table this small.

use std::collections::HashMap;

use twox_hash::XxHash32;

use crate::description::{GraphDescription, NodeIndex, ParamIndex, TriggerIndex};
use crate::graph::CompiledGraph;
use crate::trigger::FireError;

/// Hash of a node instance name; seeds the per-socket hashes.
pub fn node_name_hash(name: &str) -> u32 {
    XxHash32::oneshot(0, name.as_bytes())
}

/// Hash addressing a named parameter of a named node.
pub fn parameter_hash(node_name: &str, parameter: &str) -> u32 {
    XxHash32::oneshot(node_name_hash(node_name), parameter.as_bytes())
}

/// Hash addressing a named trigger input of a named node.
pub fn trigger_hash(node_name: &str, trigger: &str) -> u32 {
    XxHash32::oneshot(node_name_hash(node_name), trigger.as_bytes())
}

/// Hash → index resolution tables for one graph description.
///
/// Built from the description alone, so it can live with the host's control
/// code while the compiled graph stays on the audio side.
pub struct GraphAccess {
    parameters: HashMap<u32, (NodeIndex, ParamIndex)>,
    triggers: HashMap<u32, (NodeIndex, TriggerIndex)>,
}

impl GraphAccess {
    /// Hashes every named parameter and trigger input of every named node.
    pub fn build(desc: &GraphDescription) -> Self {
        let mut named_params = 0;
        let mut named_triggers = 0;
        for instance in desc.nodes.iter().filter(|n| n.name.is_some()) {
            named_params += instance.spec.params.iter().filter(|p| p.name.is_some()).count();
            named_triggers += instance
                .spec
                .trigger_inputs
                .iter()
                .filter(|t| t.name.is_some())
                .count();
        }

        let mut parameters = HashMap::with_capacity(named_params);
        let mut triggers = HashMap::with_capacity(named_triggers);

        for (i, instance) in desc.nodes.iter().enumerate() {
            let Some(name) = instance.name.as_deref() else {
                continue;
            };
            let seed = node_name_hash(name);
            for (p, param) in instance.spec.params.iter().enumerate() {
                if let Some(param_name) = param.name {
                    let hash = XxHash32::oneshot(seed, param_name.as_bytes());
                    parameters.insert(hash, (i as NodeIndex, p as ParamIndex));
                }
            }
            for (t, trigger) in instance.spec.trigger_inputs.iter().enumerate() {
                if let Some(trigger_name) = trigger.name {
                    let hash = XxHash32::oneshot(seed, trigger_name.as_bytes());
                    triggers.insert(hash, (i as NodeIndex, t as TriggerIndex));
                }
            }
        }

        Self {
            parameters,
            triggers,
        }
    }

    /// The `(node, parameter)` pair behind a hash, if registered.
    pub fn parameter_target(&self, hash: u32) -> Option<(NodeIndex, ParamIndex)> {
        self.parameters.get(&hash).copied()
    }

    /// The `(node, trigger input)` pair behind a hash, if registered.
    pub fn trigger_target(&self, hash: u32) -> Option<(NodeIndex, TriggerIndex)> {
        self.triggers.get(&hash).copied()
    }

    /// Sets a parameter by hash. Returns `false` for unknown hashes.
    pub fn set_parameter(&self, graph: &mut CompiledGraph, hash: u32, value: f32) -> bool {
        match self.parameter_target(hash) {
            Some((node, param)) => graph.set_parameter(node, param, value),
            None => false,
        }
    }

    /// Reads a parameter by hash.
    pub fn parameter(&self, graph: &CompiledGraph, hash: u32) -> Option<f32> {
        let (node, param) = self.parameter_target(hash)?;
        graph.parameter(node, param)
    }

    /// Fires a trigger input by hash.
    pub fn fire_trigger(&self, graph: &mut CompiledGraph, hash: u32) -> Result<(), FireError> {
        let (node, trigger) = self
            .trigger_target(hash)
            .ok_or(FireError::UnknownTarget)?;
        graph.fire_trigger(node, trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_hash_is_seeded_by_node_name() {
        let a = parameter_hash("voice_a", "Gain");
        let b = parameter_hash("voice_b", "Gain");
        assert_ne!(a, b);
        assert_eq!(a, parameter_hash("voice_a", "Gain"));
    }

    #[test]
    fn trigger_and_parameter_spaces_share_the_seed() {
        // Same strings hash identically across the two helpers; the tables
        // keep the spaces apart.
        assert_eq!(parameter_hash("n", "Start"), trigger_hash("n", "Start"));
    }
}
