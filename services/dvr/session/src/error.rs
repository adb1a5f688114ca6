//! Session and channel error types.

use dvr_routing::RoutingError;
use dvr_wire::{NodeId, PacketType, WireError};
use thiserror::Error;

/// Errors raised by a [`PacketChannel`](crate::PacketChannel)
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The relay closed the connection
    #[error("channel closed")]
    Closed,

    /// Network or socket failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be encoded or decoded
    #[error("frame error: {0}")]
    Frame(#[from] WireError),
}

impl ChannelError {
    /// Whether the session has to end.
    ///
    /// A single undecodable frame is dropped and the channel stays usable;
    /// everything else ends the session.
    pub fn is_fatal(&self) -> bool {
        match self {
            ChannelError::Frame(e) => !e.is_recoverable(),
            ChannelError::Closed | ChannelError::Io(_) => true,
        }
    }
}

/// Errors that abort a session before routing starts
#[derive(Error, Debug)]
pub enum SessionError {
    /// The relay answered HELLO with another packet type
    #[error("handshake reply has type {0:?}, expected Hello")]
    UnexpectedReply(PacketType),

    /// The HELLO reply did not come from the relay
    #[error("handshake reply came from node {0}, expected the relay")]
    UnexpectedSource(NodeId),

    /// The HELLO reply carried no link costs
    #[error("handshake reply carries no link costs")]
    MissingLinkCosts,

    /// The link costs do not describe a usable topology
    #[error("invalid link costs: {0}")]
    LinkCosts(#[from] RoutingError),

    /// The channel failed during the handshake
    #[error("channel failed during handshake: {0}")]
    Channel(#[from] ChannelError),
}
