//! Direct neighbors and their link costs

use dvr_wire::{Cost, NodeId, INFINITY};
use serde::Serialize;

/// Peers directly reachable from the local node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborTable {
    /// Local node ID
    local_node_id: NodeId,
    /// Direct link cost to every node, `INFINITY` where there is no link
    link_costs: Vec<Cost>,
    /// `neighbors[i]` is set iff `i` is a direct neighbor
    neighbors: Vec<bool>,
}

impl NeighborTable {
    /// Derive the neighbor set from a link-cost vector.
    ///
    /// `i` is a neighbor iff `i != local_node_id` and its link cost is not
    /// `INFINITY`. Costs are clamped to `INFINITY`; the local entry is
    /// always zero.
    pub fn from_link_costs(local_node_id: NodeId, link_costs: &[Cost]) -> Self {
        let link_costs: Vec<Cost> = link_costs
            .iter()
            .enumerate()
            .map(|(i, &cost)| {
                if i == local_node_id as usize {
                    0
                } else {
                    cost.min(INFINITY)
                }
            })
            .collect();

        let neighbors = link_costs
            .iter()
            .enumerate()
            .map(|(i, &cost)| i != local_node_id as usize && cost != INFINITY)
            .collect();

        Self {
            local_node_id,
            link_costs,
            neighbors,
        }
    }

    /// Check if a node is a direct neighbor
    pub fn is_neighbor(&self, node: NodeId) -> bool {
        self.neighbors.get(node as usize).copied().unwrap_or(false)
    }

    /// Direct cost to a node; `INFINITY` for anything that is not a neighbor
    /// (the local node itself costs zero)
    pub fn link_cost(&self, node: NodeId) -> Cost {
        if node == self.local_node_id {
            return 0;
        }
        if self.is_neighbor(node) {
            self.link_costs[node as usize]
        } else {
            INFINITY
        }
    }

    /// The normalized link-cost vector
    pub fn link_costs(&self) -> &[Cost] {
        &self.link_costs
    }

    /// Iterate over neighbor ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .filter(|&(_, &is_neighbor)| is_neighbor)
            .map(|(i, _)| i as NodeId)
    }

    /// Number of neighbors
    pub fn len(&self) -> usize {
        self.neighbors.iter().filter(|&&n| n).count()
    }

    /// Whether the node has no neighbors at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
