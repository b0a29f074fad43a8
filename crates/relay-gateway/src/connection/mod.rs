//! Connection management
//!
//! A [`Connection`] is one live WebSocket; the [`SessionRegistry`] holds
//! every admitted connection and indexes them by identity.

mod connection;
mod registry;

pub use connection::{Connection, ConnectionState};
pub use registry::{DuplicateConnection, SessionRegistry};
