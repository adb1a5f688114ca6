//! N x N table of advertised distance vectors

use dvr_wire::{Cost, NodeId, INFINITY};
use serde::Serialize;

/// Row `r` holds the latest distance vector known for node `r`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostMatrix {
    rows: Vec<Vec<Cost>>,
}

impl CostMatrix {
    /// Create an `n x n` matrix with every entry `INFINITY`
    pub fn new(n: usize) -> Self {
        Self {
            rows: vec![vec![INFINITY; n]; n],
        }
    }

    /// Number of nodes
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Distance vector of a node
    pub fn row(&self, node: NodeId) -> &[Cost] {
        &self.rows[node as usize]
    }

    /// Replace a node's vector wholesale.
    ///
    /// Callers validate the length; entries are clamped to `INFINITY`.
    pub fn set_row(&mut self, node: NodeId, mut vector: Vec<Cost>) {
        debug_assert_eq!(vector.len(), self.size());
        for cost in vector.iter_mut() {
            *cost = (*cost).min(INFINITY);
        }
        self.rows[node as usize] = vector;
    }

    /// Cost advertised by `from` towards `to`
    pub fn get(&self, from: NodeId, to: NodeId) -> Cost {
        self.rows[from as usize][to as usize]
    }

    pub(crate) fn set(&mut self, from: NodeId, to: NodeId, cost: Cost) {
        self.rows[from as usize][to as usize] = cost;
    }
}
