//! Gateway wire protocol
//!
//! Defines the JSON event envelope, event names, and payload shapes
//! exchanged over the WebSocket. Event names and payload fields are a
//! stable contract with clients.

mod envelope;
mod events;
mod payloads;

pub use envelope::{ClientFrame, EventEnvelope, ProtocolError};
pub use events::EventName;
pub use payloads::{
    ErrorPayload, MembershipPayload, MessagePayload, OnlineUserPayload, PrivateMessagePayload,
    SendMessagePayload, SendPrivatePayload, TypingPayload,
};
