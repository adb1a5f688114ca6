//! Packet model, protocol constants and frame codec for the distance-vector router.
//!
//! Nodes talk to each other only through a relay. Every message on that
//! connection is one [`Packet`] wrapped in a length-prefixed, checksummed frame.
//!
//! ## Wire Format
//!
//! ```text
//! +----------------------+----------------------------+
//! | u32 frame_len        | length of bytes that follow|
//! +----------------------+----------------------------+
//! | Packet header (16B)  | type, src, dst, vector len |
//! +----------------------+----------------------------+
//! | u32 cost * len       | distance vector (optional) |
//! +----------------------+----------------------------+
//! | u32 crc32            | over header and vector     |
//! +----------------------+----------------------------+
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod frame;
pub mod header;
pub mod packet;

// Re-export main types
pub use error::WireError;
pub use frame::{encode_packet, encoded_size, FrameDecoder, DEFAULT_MAX_FRAME_SIZE};
pub use header::{
    add_cost, Cost, Flags, NodeId, PacketHeader, PacketType, HEADER_SIZE, INFINITY,
    RELAY_NODE_ID, WIRE_VERSION,
};
pub use packet::Packet;
