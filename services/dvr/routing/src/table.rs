//! Forwarding table produced by a routing session

use dvr_wire::{Cost, NodeId, INFINITY};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Next hop and cost towards every destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingTable {
    /// Node this table belongs to
    pub node_id: NodeId,
    /// `next_hop[i]` is the neighbor towards `i`; `node_id` means no route
    pub next_hop: Vec<NodeId>,
    /// `min_cost[i]` is the best known cost towards `i`
    pub min_cost: Vec<Cost>,
}

/// A single usable route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Neighbor to forward to
    pub next_hop: NodeId,
    /// Total cost to the destination
    pub cost: Cost,
}

impl ForwardingTable {
    /// Create a forwarding table
    pub fn new(node_id: NodeId, next_hop: Vec<NodeId>, min_cost: Vec<Cost>) -> Self {
        Self {
            node_id,
            next_hop,
            min_cost,
        }
    }

    /// Number of destinations
    pub fn len(&self) -> usize {
        self.min_cost.len()
    }

    /// Whether the table has no destinations
    pub fn is_empty(&self) -> bool {
        self.min_cost.is_empty()
    }

    /// Route towards a remote destination, if one is known
    pub fn route(&self, dst: NodeId) -> Option<Route> {
        if dst == self.node_id {
            return None;
        }
        let cost = *self.min_cost.get(dst as usize)?;
        let next_hop = *self.next_hop.get(dst as usize)?;
        if cost >= INFINITY || next_hop == self.node_id {
            return None;
        }
        Some(Route { next_hop, cost })
    }

    /// Number of remote destinations with a known route
    pub fn reachable_count(&self) -> usize {
        (0..self.len() as NodeId)
            .filter(|&dst| self.route(dst).is_some())
            .count()
    }
}

impl fmt::Display for ForwardingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forwarding table at node {}", self.node_id)?;
        writeln!(f, "{:>6} {:>8} {:>6}", "dest", "next-hop", "cost")?;
        for dst in 0..self.len() as NodeId {
            if dst == self.node_id {
                writeln!(f, "{:>6} {:>8} {:>6}", dst, "local", 0)?;
                continue;
            }
            match self.route(dst) {
                Some(route) => writeln!(f, "{:>6} {:>8} {:>6}", dst, route.next_hop, route.cost)?,
                None => writeln!(f, "{:>6} {:>8} {:>6}", dst, "-", "-")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ForwardingTable {
        ForwardingTable::new(0, vec![0, 1, 1, 0], vec![0, 1, 3, INFINITY])
    }

    #[test]
    fn test_route_lookup() {
        let table = sample();
        assert_eq!(table.route(0), None);
        assert_eq!(
            table.route(2),
            Some(Route {
                next_hop: 1,
                cost: 3
            })
        );
        assert_eq!(table.route(3), None);
        assert_eq!(table.route(9), None);
        assert_eq!(table.reachable_count(), 2);
    }

    #[test]
    fn test_display() {
        let text = sample().to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Forwarding table at node 0");
        assert_eq!(lines.len(), 6);
        assert!(lines[2].contains("local"));
        assert!(lines[4].ends_with('3'));
        assert!(lines[5].ends_with('-'));
    }

    #[test]
    fn test_json_output() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["node_id"], 0);
        assert_eq!(json["min_cost"][3], INFINITY);
        assert_eq!(json["next_hop"][2], 1);
    }
}
