//! Duplex packet channel to the relay

use crate::error::ChannelError;
use async_trait::async_trait;
use dvr_wire::Packet;

/// Reliable, ordered packet exchange with the relay.
///
/// `receive` must be cancel-safe: the protocol handler races it against the
/// advertisement timer, and a packet that was partially read when the timer
/// won must still be delivered by the next call.
#[async_trait]
pub trait PacketChannel: Send {
    /// Send one packet
    async fn send(&mut self, packet: &Packet) -> Result<(), ChannelError>;

    /// Wait for the next packet
    async fn receive(&mut self) -> Result<Packet, ChannelError>;

    /// Close the channel; further calls are no-ops
    async fn close(&mut self);
}
