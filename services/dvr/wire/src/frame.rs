//! Length-prefixed framing for routing packets.
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

use crate::header::{Flags, PacketHeader, HEADER_SIZE, INFINITY};
use crate::packet::Packet;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

/// Default maximum frame size (64 KiB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

const CHECKSUM_SIZE: usize = 4;

/// Get the encoded size of a packet, including the length prefix
pub fn encoded_size(packet: &Packet) -> usize {
    let vector_len = packet.vector.as_ref().map_or(0, Vec::len);
    4 + HEADER_SIZE + vector_len * 4 + CHECKSUM_SIZE
}

/// Encode a packet into one frame
pub fn encode_packet(packet: &Packet, max_frame_size: usize) -> Result<Bytes, crate::WireError> {
    let total_size = encoded_size(packet);
    if total_size > max_frame_size {
        return Err(crate::WireError::Size(total_size));
    }

    let mut header = PacketHeader::new(packet.typ, packet.src_node, packet.dst_node);
    if let Some(vector) = &packet.vector {
        header = header.with_vector(vector.len());
    }

    let mut buf = BytesMut::with_capacity(total_size);
    buf.put_u32((total_size - 4) as u32);

    header.encode(&mut buf);
    if let Some(vector) = &packet.vector {
        for cost in vector {
            buf.put_u32(*cost);
        }
    }

    let checksum = crc32fast::hash(&buf[4..]);
    buf.put_u32(checksum);

    Ok(buf.freeze())
}

/// Frame decoder for parsing incoming packets
#[derive(Debug)]
pub struct FrameDecoder {
    max_frame_size: usize,
}

impl FrameDecoder {
    /// Create a new frame decoder
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Create a decoder with a custom frame size limit
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Decode one packet from a buffer.
    ///
    /// Returns `Ok(None)` until a complete frame is buffered. A frame that
    /// fails to parse is removed from the buffer before the error is
    /// returned, so the caller may drop it and keep decoding.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Packet>, crate::WireError> {
        if buf.len() < 4 {
            return Ok(None);
        }

        let frame_len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;

        if frame_len > self.max_frame_size {
            return Err(crate::WireError::Size(frame_len));
        }

        if buf.len() < 4 + frame_len {
            return Ok(None);
        }

        buf.advance(4);
        let frame = buf.split_to(frame_len).freeze();
        trace!("Decoding frame of {} bytes", frame_len);

        Self::parse_frame(frame).map(Some)
    }

    fn parse_frame(frame: Bytes) -> Result<Packet, crate::WireError> {
        if frame.len() < HEADER_SIZE + CHECKSUM_SIZE {
            return Err(crate::WireError::Incomplete);
        }

        let body_len = frame.len() - CHECKSUM_SIZE;
        let expected = u32::from_be_bytes([
            frame[body_len],
            frame[body_len + 1],
            frame[body_len + 2],
            frame[body_len + 3],
        ]);
        let actual = crc32fast::hash(&frame[..body_len]);
        if expected != actual {
            return Err(crate::WireError::Checksum { expected, actual });
        }

        let mut body = frame.slice(..body_len);
        let header = PacketHeader::decode(&mut body)?;

        let declared = header.vector_len as usize;
        if body.len() != declared * 4 {
            return Err(crate::WireError::VectorLength {
                declared,
                available: body.len(),
            });
        }

        let vector = if header.flags.contains(Flags::HAS_VECTOR) {
            let mut costs = Vec::with_capacity(declared);
            for _ in 0..declared {
                // costs beyond the sentinel carry no extra meaning
                costs.push(body.get_u32().min(INFINITY));
            }
            Some(costs)
        } else {
            None
        };

        Ok(Packet {
            typ: header.typ,
            src_node: header.src_node,
            dst_node: header.dst_node,
            vector,
        })
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
