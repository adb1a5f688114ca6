//! Neighbor table, cost matrix and distance-vector engine for the router.
//!
//! This crate holds the routing state of a single node: which peers are
//! directly attached and at what cost, the last vector each node advertised,
//! and the next hop chosen for every destination by distributed
//! Bellman-Ford relaxation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod error;
pub mod matrix;
pub mod neighbor;
pub mod table;

pub use engine::*;
pub use error::*;
pub use matrix::*;
pub use neighbor::*;
pub use table::*;
