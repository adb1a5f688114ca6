//! Routing protocol packets.

use crate::header::{Cost, NodeId, PacketType, INFINITY, RELAY_NODE_ID};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A routing protocol packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Packet type
    pub typ: PacketType,
    /// Node that sent the packet
    pub src_node: NodeId,
    /// Node the packet is addressed to
    pub dst_node: NodeId,
    /// Cost vector, present for HELLO replies and ROUTE packets
    pub vector: Option<Vec<Cost>>,
}

impl Packet {
    /// HELLO sent by a node to open its session
    pub fn hello(src_node: NodeId, dst_node: NodeId) -> Self {
        Self {
            typ: PacketType::Hello,
            src_node,
            dst_node,
            vector: None,
        }
    }

    /// HELLO reply from the relay carrying the node's link costs
    pub fn hello_with_costs(src_node: NodeId, dst_node: NodeId, link_costs: Vec<Cost>) -> Self {
        Self {
            typ: PacketType::Hello,
            src_node,
            dst_node,
            vector: Some(link_costs),
        }
    }

    /// ROUTE carrying a full distance vector
    pub fn route(src_node: NodeId, dst_node: NodeId, vector: Vec<Cost>) -> Self {
        Self {
            typ: PacketType::Route,
            src_node,
            dst_node,
            vector: Some(vector),
        }
    }

    /// QUIT ending the session
    pub fn quit(src_node: NodeId, dst_node: NodeId) -> Self {
        Self {
            typ: PacketType::Quit,
            src_node,
            dst_node,
            vector: None,
        }
    }

    /// Whether the relay sent this packet
    pub fn is_from_relay(&self) -> bool {
        self.src_node == RELAY_NODE_ID
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} -> {}", self.typ, self.src_node, self.dst_node)?;
        if let Some(vector) = &self.vector {
            write!(f, " [")?;
            for (i, cost) in vector.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                if *cost >= INFINITY {
                    write!(f, "inf")?;
                } else {
                    write!(f, "{}", cost)?;
                }
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
