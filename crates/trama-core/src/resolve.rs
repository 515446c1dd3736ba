//! Recursive channel-count resolution over the aliasing socket graph.
//!
//! An output socket's channel count is only explicit for [`OutputAlloc::Fixed`]
//! sockets; `PassThrough` and `AsInput` sockets inherit it from whatever feeds
//! the referenced input. Resolution follows that chain backwards until it hits
//! a fixed declaration or an external input.
//!
//! Recursion terminates without a cycle guard because the feed-forward
//! invariant is validated before any resolution runs: every internal source
//! index is strictly below the consumer's, so each step strictly decreases.

use crate::description::{GraphDescription, NodeIndex, OutputAlloc, SocketIndex, SourceSocket};
use crate::plan::TopologyError;

/// Resolves the channel count an output socket carries at render time.
pub(crate) fn resolved_channels(
    desc: &GraphDescription,
    node: NodeIndex,
    output: SocketIndex,
) -> Result<u8, TopologyError> {
    let alloc = output_alloc(desc, node, output)?;
    match alloc {
        OutputAlloc::Fixed(channels) => Ok(channels),
        OutputAlloc::PassThrough(input) | OutputAlloc::AsInput(input) => {
            source_channels(desc, node, input)
        }
    }
}

/// Resolves the channel count an output socket *allocates* from the scratch
/// arena. `PassThrough` borrows an upstream buffer and contributes zero.
pub(crate) fn allocated_channels(
    desc: &GraphDescription,
    node: NodeIndex,
    output: SocketIndex,
) -> Result<u8, TopologyError> {
    let alloc = output_alloc(desc, node, output)?;
    match alloc {
        OutputAlloc::PassThrough(_) => Ok(0),
        OutputAlloc::Fixed(channels) => Ok(channels),
        OutputAlloc::AsInput(input) => source_channels(desc, node, input),
    }
}

/// Channel count of whatever feeds `input` on `node`.
fn source_channels(
    desc: &GraphDescription,
    node: NodeIndex,
    input: SocketIndex,
) -> Result<u8, TopologyError> {
    let instance = &desc.nodes[node as usize];
    if input >= instance.spec.audio_inputs {
        return Err(TopologyError::InvalidInputSocket { node, input });
    }
    let conn = instance
        .audio_connections
        .iter()
        .find(|c| c.input == input)
        .ok_or(TopologyError::UnconnectedReference { node, input })?;
    match conn.source {
        SourceSocket::External(external) => desc
            .externals
            .get(external as usize)
            .map(|e| e.channels)
            .ok_or(TopologyError::InvalidExternalInput { node, external }),
        SourceSocket::Node {
            node: source,
            output,
        } => resolved_channels(desc, source, output),
    }
}

fn output_alloc(
    desc: &GraphDescription,
    node: NodeIndex,
    output: SocketIndex,
) -> Result<OutputAlloc, TopologyError> {
    desc.nodes[node as usize]
        .spec
        .audio_outputs
        .get(output as usize)
        .copied()
        .ok_or(TopologyError::InvalidOutputSocket { node, output })
}
