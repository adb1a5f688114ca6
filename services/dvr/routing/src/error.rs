//! Routing error types.

use dvr_wire::NodeId;
use thiserror::Error;

/// Errors raised when routing input does not fit the session topology
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// Link-cost vector without entries
    #[error("empty link-cost vector")]
    EmptyVector,

    /// Node id outside `[0, N)`
    #[error("node {node} outside topology of {size} nodes")]
    NodeOutOfRange {
        /// Offending node id
        node: NodeId,
        /// Number of nodes in the topology
        size: usize,
    },

    /// Topology would contain the relay's reserved id
    #[error("topology of {0} nodes overlaps the relay id")]
    TopologyTooLarge(usize),

    /// Vector length differs from the topology size
    #[error("vector has {got} entries, expected {expected}")]
    VectorLength {
        /// Number of nodes in the topology
        expected: usize,
        /// Number of entries received
        got: usize,
    },

    /// A peer advertisement claiming to come from this node
    #[error("advertisement from own node id {0}")]
    SelfAdvertisement(NodeId),
}
