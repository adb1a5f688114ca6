//! Wire protocol error types.

use thiserror::Error;

/// Wire protocol errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Incomplete header (need more data)
    #[error("incomplete header")]
    Incomplete,

    /// Unsupported protocol version
    #[error("version unsupported: {0}")]
    Version(u8),

    /// Unknown packet type
    #[error("unknown type {0}")]
    Type(u8),

    /// Reserved or unknown flag bits set
    #[error("reserved bits nonzero")]
    Reserved,

    /// Frame exceeds the configured size limit
    #[error("size limit exceeded: {0}")]
    Size(usize),

    /// Frame checksum mismatch
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    Checksum {
        /// Checksum carried in the frame
        expected: u32,
        /// Checksum computed over the received bytes
        actual: u32,
    },

    /// Declared vector length does not fit the frame
    #[error("vector length {declared} does not match {available} available bytes")]
    VectorLength {
        /// Number of entries announced by the header
        declared: usize,
        /// Bytes left in the frame for the vector
        available: usize,
    },

    /// Vector presence contradicts the packet type
    #[error("malformed packet")]
    Malformed,
}

impl WireError {
    /// Whether the decoder can keep reading after this error.
    ///
    /// Every error raised after the frame length is known consumes exactly one
    /// frame, so only an oversize length prefix leaves the stream out of sync.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, WireError::Size(_))
    }
}
