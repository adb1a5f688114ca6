//! HELLO handshake with the relay.
//!
//! The node announces itself with a HELLO addressed to the relay and waits
//! for exactly one reply: a HELLO from the relay carrying the node's direct
//! link costs. Any other reply aborts the session.

use crate::channel::PacketChannel;
use crate::error::SessionError;
use dvr_wire::{Cost, NodeId, Packet, PacketType, RELAY_NODE_ID};
use tracing::{debug, info, warn};

/// Run the handshake and return the link-cost vector
pub async fn perform_handshake<C>(channel: &mut C, node_id: NodeId) -> Result<Vec<Cost>, SessionError>
where
    C: PacketChannel + ?Sized,
{
    let hello = Packet::hello(node_id, RELAY_NODE_ID);
    channel.send(&hello).await?;
    debug!(component = "handshake", "Sent {}", hello);

    let reply = channel.receive().await?;
    let link_costs = parse_hello_reply(reply)?;

    info!(
        component = "handshake",
        "Handshake complete for node {}: {} nodes in topology",
        node_id,
        link_costs.len()
    );
    Ok(link_costs)
}

/// Check a handshake reply and extract the link costs
pub fn parse_hello_reply(reply: Packet) -> Result<Vec<Cost>, SessionError> {
    if reply.typ != PacketType::Hello {
        warn!(component = "handshake", "Expected HELLO, got {}", reply);
        return Err(SessionError::UnexpectedReply(reply.typ));
    }
    if !reply.is_from_relay() {
        warn!(component = "handshake", "HELLO reply not from relay: {}", reply);
        return Err(SessionError::UnexpectedSource(reply.src_node));
    }
    reply.vector.ok_or(SessionError::MissingLinkCosts)
}
