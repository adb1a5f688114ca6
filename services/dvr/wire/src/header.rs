//! Fixed packet header and protocol constants.
//!
//! Every frame starts with a 16-byte header that carries the packet type,
//! the source and destination node ids and the number of cost entries that
//! follow it.

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Wire protocol version
pub const WIRE_VERSION: u8 = 1;

/// Packet header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Dense node identifier assigned by the relay, in `[0, N)`
pub type NodeId = u32;

/// Link or path cost
pub type Cost = u32;

/// Cost sentinel meaning "no known path"
pub const INFINITY: Cost = 999;

/// Reserved node id of the relay server
pub const RELAY_NODE_ID: NodeId = 100;

/// Add two costs, saturating at [`INFINITY`].
#[inline]
pub fn add_cost(a: Cost, b: Cost) -> Cost {
    a.saturating_add(b).min(INFINITY)
}

/// Packet types as defined in the wire protocol
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketType {
    /// Session establishment (node → relay, relay → node with link costs)
    Hello = 1,
    /// Session termination
    Quit = 2,
    /// Distance vector advertisement or link-cost change
    Route = 3,
}

impl TryFrom<u8> for PacketType {
    type Error = crate::WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PacketType::Hello),
            2 => Ok(PacketType::Quit),
            3 => Ok(PacketType::Route),
            _ => Err(crate::WireError::Type(value)),
        }
    }
}

bitflags! {
    /// Header flags bitmask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Flags: u16 {
        /// A cost vector follows the header
        const HAS_VECTOR = 1 << 0;
    }
}

/// Packet header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Protocol version (must be 1)
    pub ver: u8,
    /// Packet type
    pub typ: PacketType,
    /// Header flags
    pub flags: Flags,
    /// Source node id
    pub src_node: NodeId,
    /// Destination node id
    pub dst_node: NodeId,
    /// Number of cost entries following the header
    pub vector_len: u32,
}

impl PacketHeader {
    /// Create a header without a vector
    pub fn new(typ: PacketType, src_node: NodeId, dst_node: NodeId) -> Self {
        Self {
            ver: WIRE_VERSION,
            typ,
            flags: Flags::empty(),
            src_node,
            dst_node,
            vector_len: 0,
        }
    }

    /// Mark the header as carrying `len` cost entries
    pub fn with_vector(mut self, len: usize) -> Self {
        self.flags |= Flags::HAS_VECTOR;
        self.vector_len = len as u32;
        self
    }

    /// Encode the header to bytes (big-endian)
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.ver);
        buf.put_u8(self.typ as u8);
        buf.put_u16(self.flags.bits());
        buf.put_u32(self.src_node);
        buf.put_u32(self.dst_node);
        buf.put_u32(self.vector_len);
    }

    /// Decode the header from bytes (big-endian)
    pub fn decode(buf: &mut Bytes) -> Result<Self, crate::WireError> {
        if buf.len() < HEADER_SIZE {
            return Err(crate::WireError::Incomplete);
        }

        let ver = buf.get_u8();
        if ver != WIRE_VERSION {
            return Err(crate::WireError::Version(ver));
        }

        let typ = PacketType::try_from(buf.get_u8())?;
        let flags = Flags::from_bits(buf.get_u16()).ok_or(crate::WireError::Reserved)?;
        let src_node = buf.get_u32();
        let dst_node = buf.get_u32();
        let vector_len = buf.get_u32();

        if !flags.contains(Flags::HAS_VECTOR) && vector_len != 0 {
            return Err(crate::WireError::Malformed);
        }

        Ok(Self {
            ver,
            typ,
            flags,
            src_node,
            dst_node,
            vector_len,
        })
    }
}
