//! Presence and typing coordinator
//!
//! Owns the `online users` roster, join/leave announcements, and typing
//! relay. All fan-out works from registry snapshots; the registry lock is
//! never held while delivering.

use crate::connection::{Connection, SessionRegistry};
use crate::protocol::{
    EventEnvelope, EventName, MembershipPayload, OnlineUserPayload, TypingPayload,
};
use chrono::Utc;
use relay_core::Snowflake;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Broadcasts presence and typing events to registered connections
pub struct PresenceCoordinator {
    registry: Arc<SessionRegistry>,
}

impl PresenceCoordinator {
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Create a coordinator wrapped in Arc
    #[must_use]
    pub fn new_shared(registry: Arc<SessionRegistry>) -> Arc<Self> {
        Arc::new(Self::new(registry))
    }

    /// Send the deduplicated roster to every connection
    ///
    /// An identity appears once regardless of connection count; its
    /// `socketId` is its first connection in snapshot order, so the
    /// representative is stable while that connection lives. Returns the
    /// number of successful deliveries.
    pub fn broadcast_presence(&self) -> usize {
        let snapshot = self.registry.snapshot();

        let mut seen: HashSet<Snowflake> = HashSet::new();
        let roster: Vec<OnlineUserPayload> = snapshot
            .iter()
            .filter(|conn| seen.insert(conn.user_id()))
            .map(|conn| OnlineUserPayload {
                id: conn.user_id(),
                username: conn.username().to_string(),
                socket_id: conn.connection_id(),
            })
            .collect();

        let envelope = EventEnvelope::new(
            EventName::OnlineUsers,
            serde_json::to_value(&roster).unwrap_or_default(),
        );

        let delivered = snapshot
            .iter()
            .filter(|conn| conn.try_send(envelope.clone()))
            .count();

        tracing::debug!(
            online = roster.len(),
            connections = snapshot.len(),
            delivered,
            "Presence broadcast"
        );

        delivered
    }

    /// Announce a newly admitted connection to everyone else
    pub fn announce_joined(&self, connection: &Connection) {
        let payload = MembershipPayload::new(connection.identity(), connection.joined_at());
        let envelope = EventEnvelope::new(
            EventName::UserJoined,
            serde_json::to_value(&payload).unwrap_or_default(),
        );
        self.fan_out_except(connection.connection_id(), &envelope);
    }

    /// Announce a retired connection to everyone remaining
    pub fn announce_left(&self, connection: &Connection) {
        let payload = MembershipPayload::new(connection.identity(), Utc::now());
        let envelope = EventEnvelope::new(
            EventName::UserLeft,
            serde_json::to_value(&payload).unwrap_or_default(),
        );
        self.fan_out_except(connection.connection_id(), &envelope);
    }

    /// Mark a connection as typing and notify all other connections
    ///
    /// Edge-triggered on the per-connection flag: repeated start events
    /// broadcast once. The originator is never echoed.
    pub fn start_typing(&self, connection: &Connection) {
        if !connection.set_typing(true) {
            return;
        }

        let payload = TypingPayload::from(connection.identity());
        let envelope = EventEnvelope::new(
            EventName::UserTyping,
            serde_json::to_value(&payload).unwrap_or_default(),
        );
        self.fan_out_except(connection.connection_id(), &envelope);
    }

    /// Clear a connection's typing flag and notify all other connections
    pub fn stop_typing(&self, connection: &Connection) {
        if !connection.set_typing(false) {
            return;
        }

        let payload = TypingPayload::from(connection.identity());
        let envelope = EventEnvelope::new(
            EventName::UserStoppedTyping,
            serde_json::to_value(&payload).unwrap_or_default(),
        );
        self.fan_out_except(connection.connection_id(), &envelope);
    }

    /// Drop a retiring connection's typing state without an event
    ///
    /// The `user left` announcement supersedes a stop notification.
    pub fn clear_typing(&self, connection: &Connection) {
        connection.set_typing(false);
    }

    fn fan_out_except(&self, origin: Uuid, envelope: &EventEnvelope) -> usize {
        self.registry
            .snapshot()
            .iter()
            .filter(|conn| conn.connection_id() != origin)
            .filter(|conn| conn.try_send(envelope.clone()))
            .count()
    }
}

impl std::fmt::Debug for PresenceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceCoordinator")
            .field("registry", &self.registry)
            .finish()
    }
}
