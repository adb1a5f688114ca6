//! Relay connection and protocol state machine for a routing node.
//!
//! This crate drives one node from the HELLO handshake through the
//! distance-vector exchange until the relay sends QUIT or the connection
//! fails.
//!
//! ## Features
//!
//! - **Packet channels**: TCP to a real relay, in-memory pairs for simulation
//! - **Handshake**: HELLO exchange that yields the node's link costs
//! - **Scheduler**: immediate first advertisement, periodic re-advertisement,
//!   reset on every triggered update
//! - **Handler**: single-task event loop over packets and timer expiries
//!
//! ## Example
//!
//! ```rust,no_run
//! use dvr_session::{HandlerConfig, ProtocolHandler, TcpChannel};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let channel = TcpChannel::connect("localhost", 2227).await?;
//! let config = HandlerConfig {
//!     node_id: 0,
//!     update_interval: Duration::from_millis(1000),
//! };
//!
//! let outcome = ProtocolHandler::new(config, channel).run().await?;
//! println!("{}", outcome.table);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod error;
pub mod handler;
pub mod handshake;
pub mod memory;
pub mod scheduler;
pub mod transport;

#[cfg(test)]
mod convergence;

// Re-export main types
pub use channel::PacketChannel;
pub use error::{ChannelError, SessionError};
pub use handler::{
    HandlerConfig, ProtocolHandler, ProtocolState, SessionEnd, SessionOutcome, SessionStats,
};
pub use handshake::{parse_hello_reply, perform_handshake};
pub use memory::MemoryChannel;
pub use scheduler::AdvertisementScheduler;
pub use transport::{connect_tcp, listen_tcp, TcpChannel};
