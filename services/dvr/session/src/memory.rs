//! In-process packet channel.
//!
//! Both ends exchange encoded frames, so everything a TCP relay connection
//! would exercise (framing, checksums, dropped frames) is exercised here too.
//! Used for simulations and tests.

use crate::channel::PacketChannel;
use crate::error::ChannelError;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dvr_wire::{encode_packet, FrameDecoder, Packet, DEFAULT_MAX_FRAME_SIZE};
use tokio::sync::mpsc;

/// One end of an in-memory channel
#[derive(Debug)]
pub struct MemoryChannel {
    tx: Option<mpsc::UnboundedSender<Bytes>>,
    rx: mpsc::UnboundedReceiver<Bytes>,
    decoder: FrameDecoder,
    buffer: BytesMut,
}

impl MemoryChannel {
    /// Create two connected ends
    pub fn pair() -> (MemoryChannel, MemoryChannel) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }

    fn new(tx: mpsc::UnboundedSender<Bytes>, rx: mpsc::UnboundedReceiver<Bytes>) -> Self {
        Self {
            tx: Some(tx),
            rx,
            decoder: FrameDecoder::new(),
            buffer: BytesMut::new(),
        }
    }

    /// Push raw bytes to the other end, bypassing the encoder
    pub fn send_raw(&mut self, bytes: Bytes) -> Result<(), ChannelError> {
        let tx = self.tx.as_ref().ok_or(ChannelError::Closed)?;
        tx.send(bytes).map_err(|_| ChannelError::Closed)
    }

    /// Whether this end has been closed
    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }
}

#[async_trait]
impl PacketChannel for MemoryChannel {
    async fn send(&mut self, packet: &Packet) -> Result<(), ChannelError> {
        let frame = encode_packet(packet, DEFAULT_MAX_FRAME_SIZE)?;
        self.send_raw(frame)
    }

    async fn receive(&mut self) -> Result<Packet, ChannelError> {
        loop {
            if let Some(packet) = self.decoder.decode(&mut self.buffer)? {
                return Ok(packet);
            }
            match self.rx.recv().await {
                Some(bytes) => self.buffer.extend_from_slice(&bytes),
                None => return Err(ChannelError::Closed),
            }
        }
    }

    async fn close(&mut self) {
        self.tx = None;
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvr_wire::{PacketType, RELAY_NODE_ID};

    #[tokio::test]
    async fn test_pair_delivers_in_order() {
        let (mut a, mut b) = MemoryChannel::pair();

        a.send(&Packet::route(0, 1, vec![0, 1])).await.unwrap();
        a.send(&Packet::quit(0, 1)).await.unwrap();

        assert_eq!(b.receive().await.unwrap().typ, PacketType::Route);
        assert_eq!(b.receive().await.unwrap().typ, PacketType::Quit);
    }

    #[tokio::test]
    async fn test_corrupt_frame_is_recoverable() {
        let (mut a, mut b) = MemoryChannel::pair();

        let frame = encode_packet(&Packet::route(0, 1, vec![0, 1]), DEFAULT_MAX_FRAME_SIZE).unwrap();
        let mut corrupt = BytesMut::from(frame.as_ref());
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0x55;
        a.send_raw(corrupt.freeze()).unwrap();
        a.send(&Packet::quit(RELAY_NODE_ID, 1)).await.unwrap();

        let err = b.receive().await.unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(b.receive().await.unwrap().typ, PacketType::Quit);
    }

    #[tokio::test]
    async fn test_close_ends_peer_receive() {
        let (mut a, mut b) = MemoryChannel::pair();
        a.send(&Packet::quit(0, 1)).await.unwrap();
        a.close().await;

        assert!(a.is_closed());
        assert!(b.receive().await.is_ok());
        assert!(matches!(b.receive().await, Err(ChannelError::Closed)));
        assert!(matches!(
            b.send(&Packet::quit(1, 0)).await,
            Err(ChannelError::Closed)
        ));
    }
}
