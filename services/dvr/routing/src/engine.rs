//! Distributed Bellman-Ford over the advertised cost matrix.
//!
//! The engine keeps one row per node: the local row is this node's own
//! distance vector, every other row is whatever that node last advertised.
//! Relaxation only ever lowers the local row; a raised cost reaches it only
//! through a link-cost change from the relay, which resets the local row to
//! the direct costs first. There is no split horizon or poison reverse, so
//! a route that worsens elsewhere in the network can leave a stale (too low)
//! estimate here until the relay reports a link change.

use crate::error::RoutingError;
use crate::matrix::CostMatrix;
use crate::neighbor::NeighborTable;
use crate::table::ForwardingTable;
use dvr_wire::{add_cost, Cost, NodeId, INFINITY, RELAY_NODE_ID};
use tracing::{debug, info};

/// Routing state of one node
#[derive(Debug, Clone)]
pub struct DistanceVectorEngine {
    /// Local node ID
    local_node_id: NodeId,
    /// Direct neighbors and link costs
    neighbors: NeighborTable,
    /// Advertised vectors, local row included
    matrix: CostMatrix,
    /// `next_hop[i]` is the neighbor towards `i`, or the local id if unreachable
    next_hop: Vec<NodeId>,
}

impl DistanceVectorEngine {
    /// Build the initial state from the link costs received at handshake.
    pub fn new(local_node_id: NodeId, link_costs: Vec<Cost>) -> Result<Self, RoutingError> {
        let size = link_costs.len();
        if size == 0 {
            return Err(RoutingError::EmptyVector);
        }
        if size > RELAY_NODE_ID as usize {
            return Err(RoutingError::TopologyTooLarge(size));
        }
        if local_node_id as usize >= size {
            return Err(RoutingError::NodeOutOfRange {
                node: local_node_id,
                size,
            });
        }

        let mut engine = Self {
            local_node_id,
            neighbors: NeighborTable::from_link_costs(local_node_id, &link_costs),
            matrix: CostMatrix::new(size),
            next_hop: vec![local_node_id; size],
        };
        engine.reset_local_routes();

        info!(
            component = "engine",
            "Routing state for node {} initialized: {} nodes, neighbors {:?}",
            local_node_id,
            size,
            engine.neighbors.iter().collect::<Vec<_>>()
        );
        Ok(engine)
    }

    /// Local node ID
    pub fn local_node_id(&self) -> NodeId {
        self.local_node_id
    }

    /// Number of nodes in the topology
    pub fn node_count(&self) -> usize {
        self.matrix.size()
    }

    /// Current neighbor table
    pub fn neighbors(&self) -> &NeighborTable {
        &self.neighbors
    }

    /// Full cost matrix
    pub fn matrix(&self) -> &CostMatrix {
        &self.matrix
    }

    /// Next-hop table
    pub fn next_hops(&self) -> &[NodeId] {
        &self.next_hop
    }

    /// This node's current distance vector
    pub fn distance_vector(&self) -> &[Cost] {
        self.matrix.row(self.local_node_id)
    }

    /// Store a peer's advertised vector and relax.
    ///
    /// Returns whether the local distance vector changed.
    pub fn apply_advertisement(
        &mut self,
        peer: NodeId,
        vector: Vec<Cost>,
    ) -> Result<bool, RoutingError> {
        let size = self.node_count();
        if peer as usize >= size {
            return Err(RoutingError::NodeOutOfRange { node: peer, size });
        }
        if peer == self.local_node_id {
            return Err(RoutingError::SelfAdvertisement(peer));
        }
        self.check_len(&vector)?;

        if !self.neighbors.is_neighbor(peer) {
            debug!(component = "engine", "Storing vector from non-neighbor {}", peer);
        }
        self.matrix.set_row(peer, vector);

        Ok(self.recompute())
    }

    /// Replace the direct link costs after a topology change from the relay.
    ///
    /// Neighbors are re-derived, the local row and next hops are reset to the
    /// direct links, then relaxation runs again. Returns whether the local
    /// distance vector differs from the one before the change.
    pub fn apply_link_costs(&mut self, link_costs: Vec<Cost>) -> Result<bool, RoutingError> {
        self.check_len(&link_costs)?;

        let before = self.distance_vector().to_vec();
        self.neighbors = NeighborTable::from_link_costs(self.local_node_id, &link_costs);
        self.reset_local_routes();
        self.recompute();

        let changed = before.as_slice() != self.distance_vector();
        info!(
            component = "engine",
            "Link costs changed: neighbors now {:?}, vector {}",
            self.neighbors.iter().collect::<Vec<_>>(),
            if changed { "changed" } else { "unchanged" }
        );
        Ok(changed)
    }

    /// Relax the local distance vector over every neighbor's advertisement.
    ///
    /// Returns whether any entry of the local row changed.
    pub fn recompute(&mut self) -> bool {
        let local = self.local_node_id;
        let size = self.node_count() as NodeId;
        let mut changed = false;

        for dst in 0..size {
            if dst == local {
                continue;
            }

            let mut distance = if self.next_hop[dst as usize] == local {
                INFINITY
            } else {
                self.matrix.get(local, dst)
            };
            let before = self.matrix.get(local, dst);

            for via in 0..size {
                let candidate = add_cost(self.matrix.get(via, dst), self.neighbors.link_cost(via));
                if candidate < distance {
                    distance = candidate;
                    self.next_hop[dst as usize] = via;
                    self.matrix.set(local, dst, distance);
                }
            }

            if self.matrix.get(local, dst) != before {
                debug!(
                    component = "engine",
                    "Route to {} now via {} (cost {} -> {})",
                    dst,
                    self.next_hop[dst as usize],
                    before,
                    distance
                );
                changed = true;
            }
        }

        changed
    }

    /// Snapshot of the next hops and local costs
    pub fn forwarding_table(&self) -> ForwardingTable {
        ForwardingTable::new(
            self.local_node_id,
            self.next_hop.clone(),
            self.distance_vector().to_vec(),
        )
    }

    fn reset_local_routes(&mut self) {
        let local = self.local_node_id;
        let direct = self.neighbors.link_costs().to_vec();
        self.matrix.set_row(local, direct);
        for (dst, hop) in self.next_hop.iter_mut().enumerate() {
            let dst = dst as NodeId;
            *hop = if self.neighbors.is_neighbor(dst) { dst } else { local };
        }
    }

    fn check_len(&self, vector: &[Cost]) -> Result<(), RoutingError> {
        if vector.len() != self.node_count() {
            return Err(RoutingError::VectorLength {
                expected: self.node_count(),
                got: vector.len(),
            });
        }
        Ok(())
    }
}
