//! LAN peer discovery over UDP broadcast
//!
//! Each node periodically broadcasts a [`HelloMessage`](crate::models::HelloMessage)
//! announcing the port of its sync service. Every node listens on the same
//! discovery port and records senders in the peer registry.
//!
//! Peers are keyed by the address a hello was observed from, while the port
//! and host label are taken from the payload as claimed. This is only sound
//! on a trusted local network.

pub mod broadcaster;
pub mod listener;

pub use broadcaster::Broadcaster;
pub use listener::{HelloOutcome, Listener};
