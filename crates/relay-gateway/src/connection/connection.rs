//! Individual WebSocket connection
//!
//! Holds the authenticated identity, the connection state machine, and
//! the bounded outbound queue feeding the socket's send task.

use crate::protocol::EventEnvelope;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use relay_core::{Identity, Snowflake};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// Connection lifecycle state
///
/// Transitions: Connecting → Authenticated → Closed, or Connecting →
/// Closed when admission fails late. Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Upgrade complete, admission in progress
    Connecting,
    /// Admitted into the session registry
    Authenticated,
    /// Retired; no further frames are processed
    Closed,
}

impl ConnectionState {
    /// Check whether `next` is a legal successor of this state
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Authenticated)
                | (Self::Connecting, Self::Closed)
                | (Self::Authenticated, Self::Closed)
        )
    }
}

/// A single WebSocket connection
pub struct Connection {
    /// Unique connection id, assigned at creation
    connection_id: Uuid,

    /// Authenticated identity behind this connection
    identity: Identity,

    /// When the connection was admitted
    joined_at: DateTime<Utc>,

    /// Current state machine position
    state: RwLock<ConnectionState>,

    /// Ephemeral typing flag; cleared without an event on retire
    typing: AtomicBool,

    /// Bounded queue drained by the socket's send task
    outbox: mpsc::Sender<EventEnvelope>,
}

impl Connection {
    /// Create a new connection in the `Connecting` state
    pub fn new(identity: Identity, outbox: mpsc::Sender<EventEnvelope>) -> Arc<Self> {
        Arc::new(Self {
            connection_id: Uuid::new_v4(),
            identity,
            joined_at: Utc::now(),
            state: RwLock::new(ConnectionState::Connecting),
            typing: AtomicBool::new(false),
            outbox,
        })
    }

    /// Get the connection id
    #[must_use]
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Get the identity behind this connection
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Get the identity id
    #[must_use]
    pub fn user_id(&self) -> Snowflake {
        self.identity.id
    }

    /// Get the display name
    #[must_use]
    pub fn username(&self) -> &str {
        &self.identity.username
    }

    /// Get the admission time
    #[must_use]
    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// Get the current state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Attempt a state transition; returns false if the transition table
    /// forbids it (state is left unchanged)
    pub fn transition_to(&self, next: ConnectionState) -> bool {
        let mut state = self.state.write();
        if state.can_transition_to(next) {
            *state = next;
            true
        } else {
            false
        }
    }

    /// Check if the connection has been admitted
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state() == ConnectionState::Authenticated
    }

    /// Flip the typing flag; returns true if the flag actually changed
    pub fn set_typing(&self, active: bool) -> bool {
        self.typing.swap(active, Ordering::AcqRel) != active
    }

    /// Check the typing flag
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.typing.load(Ordering::Acquire)
    }

    /// Queue an event for delivery, without blocking
    ///
    /// A full or closed outbox counts as a failed delivery: the event is
    /// dropped and logged, never retried.
    pub fn try_send(&self, envelope: EventEnvelope) -> bool {
        match self.outbox.try_send(envelope) {
            Ok(()) => true,
            Err(err) => {
                let reason = match err {
                    TrySendError::Full(_) => "outbox full",
                    TrySendError::Closed(_) => "outbox closed",
                };
                tracing::warn!(
                    connection_id = %self.connection_id,
                    user_id = %self.identity.id,
                    reason,
                    "Dropped outbound event"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connection_id", &self.connection_id)
            .field("user_id", &self.identity.id)
            .field("username", &self.identity.username)
            .field("state", &self.state())
            .finish()
    }
}
