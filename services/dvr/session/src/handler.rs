//! Protocol state machine for one routing node.
//!
//! The handler owns the relay channel, the routing engine and the
//! advertisement timer. Inbound packets and timer expiries are merged in a
//! single `select!` loop, so routing state is only ever touched from one
//! place and needs no locking.

use crate::channel::PacketChannel;
use crate::error::{ChannelError, SessionError};
use crate::handshake::perform_handshake;
use crate::scheduler::AdvertisementScheduler;
use dvr_routing::{DistanceVectorEngine, ForwardingTable};
use dvr_wire::{NodeId, Packet, PacketType};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Configuration for a routing session
#[derive(Clone, Debug)]
pub struct HandlerConfig {
    /// This node's ID
    pub node_id: NodeId,
    /// Interval between periodic advertisements
    pub update_interval: Duration,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            node_id: 0,
            update_interval: Duration::from_millis(1000),
        }
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    /// Waiting for the relay's HELLO reply
    Handshaking,
    /// Exchanging distance vectors
    Active,
    /// Session over
    Terminated,
}

/// Counters for a session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Packets read from the channel
    pub packets_received: u64,
    /// Packets written to the channel
    pub packets_sent: u64,
    /// Timer-driven broadcasts
    pub periodic_broadcasts: u64,
    /// Broadcasts triggered by a changed distance vector
    pub triggered_broadcasts: u64,
    /// ROUTE packets from peers
    pub advertisements: u64,
    /// ROUTE packets from the relay
    pub link_cost_changes: u64,
    /// Packets reported and ignored
    pub anomalies: u64,
    /// Frames that could not be decoded
    pub dropped_frames: u64,
}

/// How an active session ended
#[derive(Debug)]
pub enum SessionEnd {
    /// The relay sent QUIT
    Quit,
    /// The channel failed; the table is whatever was computed last
    ChannelFailed(ChannelError),
}

/// Result of a session that got past the handshake
#[derive(Debug)]
pub struct SessionOutcome {
    /// Final forwarding table
    pub table: ForwardingTable,
    /// How the session ended
    pub end: SessionEnd,
    /// Session counters
    pub stats: SessionStats,
}

enum Flow {
    Continue,
    Quit,
}

/// Drives one node through handshake, routing and termination
pub struct ProtocolHandler<C> {
    config: HandlerConfig,
    channel: C,
    state: ProtocolState,
    stats: SessionStats,
}

impl<C: PacketChannel> ProtocolHandler<C> {
    /// Create a handler over an open channel
    pub fn new(config: HandlerConfig, channel: C) -> Self {
        Self {
            config,
            channel,
            state: ProtocolState::Handshaking,
            stats: SessionStats::default(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// Run the session until QUIT or a channel failure.
    ///
    /// The channel is closed exactly once, whatever the exit path.
    pub async fn run(mut self) -> Result<SessionOutcome, SessionError> {
        let result = self.run_session().await;
        self.channel.close().await;
        self.transition(ProtocolState::Terminated);
        result
    }

    async fn run_session(&mut self) -> Result<SessionOutcome, SessionError> {
        let node_id = self.config.node_id;
        info!(component = "handler", "Starting session for node {}", node_id);

        let link_costs = perform_handshake(&mut self.channel, node_id).await?;
        self.stats.packets_sent += 1;
        self.stats.packets_received += 1;

        let mut engine = DistanceVectorEngine::new(node_id, link_costs)?;
        let mut scheduler = AdvertisementScheduler::new(self.config.update_interval);
        self.transition(ProtocolState::Active);
        scheduler.start();

        let end = loop {
            tokio::select! {
                biased;

                inbound = self.channel.receive() => {
                    match inbound {
                        Ok(packet) => {
                            self.stats.packets_received += 1;
                            match self.dispatch(&mut engine, &mut scheduler, packet).await {
                                Ok(Flow::Continue) => {}
                                Ok(Flow::Quit) => break SessionEnd::Quit,
                                Err(e) => {
                                    error!(component = "handler", "Failed to send update: {}", e);
                                    break SessionEnd::ChannelFailed(e);
                                }
                            }
                        }
                        Err(e) if !e.is_fatal() => {
                            warn!(component = "handler", "Dropping undecodable packet: {}", e);
                            self.stats.dropped_frames += 1;
                        }
                        Err(e) => {
                            error!(component = "handler", "Channel to relay failed: {}", e);
                            break SessionEnd::ChannelFailed(e);
                        }
                    }
                }

                _ = scheduler.expired() => {
                    if let Err(e) = self.broadcast(&engine).await {
                        error!(component = "handler", "Failed to send periodic update: {}", e);
                        break SessionEnd::ChannelFailed(e);
                    }
                    self.stats.periodic_broadcasts += 1;
                    scheduler.rearm();
                }
            }
        };

        scheduler.cancel();
        info!(
            component = "handler",
            "Session for node {} ended ({:?}): {} received, {} sent, {} triggered and {} periodic broadcasts, {} anomalies",
            node_id,
            end,
            self.stats.packets_received,
            self.stats.packets_sent,
            self.stats.triggered_broadcasts,
            self.stats.periodic_broadcasts,
            self.stats.anomalies
        );

        Ok(SessionOutcome {
            table: engine.forwarding_table(),
            end,
            stats: self.stats.clone(),
        })
    }

    async fn dispatch(
        &mut self,
        engine: &mut DistanceVectorEngine,
        scheduler: &mut AdvertisementScheduler,
        packet: Packet,
    ) -> Result<Flow, ChannelError> {
        debug!(component = "handler", "Received {}", packet);

        match packet.typ {
            PacketType::Quit => {
                info!(component = "handler", "Received QUIT from {}", packet.src_node);
                scheduler.cancel();
                Ok(Flow::Quit)
            }

            PacketType::Hello => {
                warn!(
                    component = "handler",
                    "Unexpected HELLO from {} after handshake; ignoring", packet.src_node
                );
                self.stats.anomalies += 1;
                Ok(Flow::Continue)
            }

            PacketType::Route => {
                let src = packet.src_node;
                let from_relay = packet.is_from_relay();
                let Some(vector) = packet.vector else {
                    warn!(component = "handler", "ROUTE from {} without a vector; ignoring", src);
                    self.stats.anomalies += 1;
                    return Ok(Flow::Continue);
                };

                let result = if from_relay {
                    self.stats.link_cost_changes += 1;
                    engine.apply_link_costs(vector)
                } else {
                    self.stats.advertisements += 1;
                    engine.apply_advertisement(src, vector)
                };

                match result {
                    Ok(true) => {
                        self.broadcast(engine).await?;
                        self.stats.triggered_broadcasts += 1;
                        scheduler.rearm();
                    }
                    Ok(false) => {
                        debug!(component = "handler", "Vector unchanged after ROUTE from {}", src);
                    }
                    Err(e) => {
                        warn!(component = "handler", "Ignoring ROUTE from {}: {}", src, e);
                        self.stats.anomalies += 1;
                    }
                }
                Ok(Flow::Continue)
            }
        }
    }

    /// Send the current vector to every neighbor
    async fn broadcast(&mut self, engine: &DistanceVectorEngine) -> Result<(), ChannelError> {
        let node_id = self.config.node_id;
        let vector = engine.distance_vector().to_vec();

        for neighbor in engine.neighbors().iter() {
            self.channel
                .send(&Packet::route(node_id, neighbor, vector.clone()))
                .await?;
            self.stats.packets_sent += 1;
        }

        debug!(
            component = "handler",
            "Advertised {:?} to {} neighbors",
            vector,
            engine.neighbors().len()
        );
        Ok(())
    }

    fn transition(&mut self, next: ProtocolState) {
        if self.state != next {
            info!(component = "handler", "Node {}: {:?} -> {:?}", self.config.node_id, self.state, next);
            self.state = next;
        }
    }
}
