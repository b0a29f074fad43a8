//! Gateway event envelope
//!
//! Every frame on the wire is a JSON object `{"event": <name>, "data":
//! <payload>}`. The `data` member is omitted for events that carry no
//! payload (typing start/stop).

use super::{ErrorPayload, EventName, SendMessagePayload, SendPrivatePayload};
use relay_core::Snowflake;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Envelope for all WebSocket frames
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event name, matched byte-for-byte against the wire contract
    pub event: String,

    /// Event payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A validated client-to-server frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// Send a public message
    ChatMessage { text: String },
    /// Send a private message to one identity
    PrivateMessage { to_user_id: Snowflake, text: String },
    /// Caller started typing
    TypingStart,
    /// Caller stopped typing
    TypingStop,
}

/// Why an inbound frame was rejected
///
/// Protocol errors are reported back on the `error` event; they never
/// terminate the connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Event not accepted from clients: {0}")]
    ServerOnlyEvent(EventName),

    #[error("Invalid payload for {event}: {reason}")]
    InvalidPayload { event: EventName, reason: String },
}

impl EventEnvelope {
    /// Create an envelope for a named event
    #[must_use]
    pub fn new(event: EventName, data: Value) -> Self {
        Self {
            event: event.as_str().to_string(),
            data: Some(data),
        }
    }

    /// Create an `error` event envelope
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        let payload = ErrorPayload::new(message);
        Self::new(
            EventName::Error,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Parse the event name
    #[must_use]
    pub fn event_name(&self) -> Option<EventName> {
        EventName::parse(&self.event)
    }

    /// Interpret this envelope as a client frame
    ///
    /// # Errors
    /// Returns [`ProtocolError`] if the event is unknown, not a
    /// client-sendable event, or carries a payload that does not decode.
    pub fn to_client_frame(&self) -> Result<ClientFrame, ProtocolError> {
        let event = self
            .event_name()
            .ok_or_else(|| ProtocolError::UnknownEvent(self.event.clone()))?;

        if !event.is_client_event() {
            return Err(ProtocolError::ServerOnlyEvent(event));
        }

        match event {
            EventName::ChatMessage => {
                let payload: SendMessagePayload = self.decode_data(event)?;
                Ok(ClientFrame::ChatMessage { text: payload.text })
            }
            EventName::PrivateMessage => {
                let payload: SendPrivatePayload = self.decode_data(event)?;
                Ok(ClientFrame::PrivateMessage {
                    to_user_id: payload.to_user_id,
                    text: payload.text,
                })
            }
            EventName::TypingStart => Ok(ClientFrame::TypingStart),
            EventName::TypingStop => Ok(ClientFrame::TypingStop),
            // is_client_event filtered everything else out above
            _ => Err(ProtocolError::ServerOnlyEvent(event)),
        }
    }

    fn decode_data<T: serde::de::DeserializeOwned>(
        &self,
        event: EventName,
    ) -> Result<T, ProtocolError> {
        let data = self
            .data
            .clone()
            .ok_or_else(|| ProtocolError::InvalidPayload {
                event,
                reason: "missing payload".to_string(),
            })?;

        serde_json::from_value(data).map_err(|e| ProtocolError::InvalidPayload {
            event,
            reason: e.to_string(),
        })
    }

    /// Serialize to a JSON string
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if the input is not a valid envelope.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for EventEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventEnvelope({})", self.event)
    }
}
