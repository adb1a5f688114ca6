//! TCP transport to the relay.
//!
//! Packets travel as length-prefixed frames over a single TCP connection.
//! Reads go through a persistent buffer so that a `receive` call cancelled
//! half-way through a frame loses nothing.

use crate::channel::PacketChannel;
use crate::error::ChannelError;
use async_trait::async_trait;
use bytes::BytesMut;
use dvr_wire::{encode_packet, FrameDecoder, Packet, DEFAULT_MAX_FRAME_SIZE};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, trace};

/// Create a TCP listener bound to the given address
pub async fn listen_tcp(addr: SocketAddr) -> tokio::io::Result<TcpListener> {
    TcpListener::bind(addr).await
}

/// Connect to a relay by host name and port
pub async fn connect_tcp(host: &str, port: u16) -> tokio::io::Result<TcpStream> {
    TcpStream::connect((host, port)).await
}

/// Packet channel over a TCP stream
#[derive(Debug)]
pub struct TcpChannel {
    stream: TcpStream,
    peer: SocketAddr,
    decoder: FrameDecoder,
    read_buffer: BytesMut,
    closed: bool,
}

impl TcpChannel {
    /// Connect to the relay
    pub async fn connect(host: &str, port: u16) -> Result<Self, ChannelError> {
        let stream = connect_tcp(host, port).await?;
        let channel = Self::from_stream(stream)?;
        debug!("Connected to relay at {}", channel.peer);
        Ok(channel)
    }

    /// Wrap an established stream
    pub fn from_stream(stream: TcpStream) -> Result<Self, ChannelError> {
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        Ok(Self {
            stream,
            peer,
            decoder: FrameDecoder::new(),
            read_buffer: BytesMut::with_capacity(16 * 1024),
            closed: false,
        })
    }

    /// Address of the remote end
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl PacketChannel for TcpChannel {
    async fn send(&mut self, packet: &Packet) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        let frame = encode_packet(packet, DEFAULT_MAX_FRAME_SIZE)?;
        self.stream.write_all(&frame).await?;
        trace!("Sent {} ({} bytes) to {}", packet, frame.len(), self.peer);
        Ok(())
    }

    async fn receive(&mut self) -> Result<Packet, ChannelError> {
        loop {
            if let Some(packet) = self.decoder.decode(&mut self.read_buffer)? {
                trace!("Received {} from {}", packet, self.peer);
                return Ok(packet);
            }
            if self.closed {
                return Err(ChannelError::Closed);
            }

            let bytes_read = self.stream.read_buf(&mut self.read_buffer).await?;
            if bytes_read == 0 {
                return Err(ChannelError::Closed);
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.stream.shutdown().await {
            debug!("Error shutting down connection to {}: {}", self.peer, e);
        }
        debug!("Closed connection to {}", self.peer);
    }
}
