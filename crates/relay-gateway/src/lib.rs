//! # relay-gateway
//!
//! WebSocket gateway for real-time bidirectional messaging.
//!
//! Connections authenticate at handshake time, live in the session
//! registry, and exchange JSON event frames. Public messages are persisted
//! then fanned out to every connection; private messages are delivered
//! only to live connections of the recipient.

pub mod auth;
pub mod connection;
pub mod lifecycle;
pub mod presence;
pub mod protocol;
pub mod router;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use server::{create_app, create_gateway_state, run, run_server, GatewayState};
