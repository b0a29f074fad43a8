//! Message router
//!
//! Routes validated message text to connections. Public messages persist
//! before any fan-out; the broadcast snapshot is taken after persistence
//! succeeds, so a stored message reaches every connection live at that
//! point. Private messages are never persisted and require the recipient
//! to be online.

use crate::connection::{Connection, SessionRegistry};
use crate::protocol::{EventEnvelope, EventName, MessagePayload, PrivateMessagePayload};
use chrono::Utc;
use relay_core::{
    DomainError, Message, MessageRepository, MessageText, NewMessage, Snowflake,
    SnowflakeGenerator,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Why a send was refused
///
/// Each error is terminal for the one send that raised it; the connection
/// stays open and other connections are unaffected.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Text failed sanitization (empty or over-length)
    #[error(transparent)]
    Validation(DomainError),

    /// Private send to an identity with no live connections
    #[error("Recipient is not online")]
    RecipientOffline,

    /// The store refused the message; nothing was broadcast
    #[error("Failed to send message")]
    Persistence(#[source] DomainError),
}

/// Routes public and private messages from authenticated connections
pub struct MessageRouter {
    registry: Arc<SessionRegistry>,
    message_repo: Arc<dyn MessageRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl MessageRouter {
    #[must_use]
    pub fn new(
        registry: Arc<SessionRegistry>,
        message_repo: Arc<dyn MessageRepository>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            registry,
            message_repo,
            id_generator,
        }
    }

    /// Sanitize, persist, and broadcast a public message
    ///
    /// The message is durable before anything is delivered; on store
    /// failure nobody sees it. Delivery is best-effort per connection.
    ///
    /// # Errors
    /// [`RouteError::Validation`] for rejected text,
    /// [`RouteError::Persistence`] if the store insert fails.
    #[instrument(skip(self, author, raw_text), fields(connection_id = %author.connection_id()))]
    pub async fn send_public(
        &self,
        author: &Connection,
        raw_text: &str,
    ) -> Result<Message, RouteError> {
        let text = MessageText::new(raw_text).map_err(RouteError::Validation)?;
        let draft = NewMessage::public(author.identity(), text);

        let stored = self.message_repo.insert(draft).await.map_err(|err| {
            tracing::error!(
                user_id = %author.user_id(),
                error = %err,
                "Failed to persist public message"
            );
            RouteError::Persistence(err)
        })?;

        let payload = MessagePayload::from(&stored);
        let envelope = EventEnvelope::new(
            EventName::ChatMessage,
            serde_json::to_value(&payload).unwrap_or_default(),
        );

        let snapshot = self.registry.snapshot();
        let total = snapshot.len();
        let delivered = snapshot
            .iter()
            .filter(|conn| conn.try_send(envelope.clone()))
            .count();

        tracing::debug!(
            message_id = %stored.id,
            user_id = %stored.author_id,
            delivered,
            connections = total,
            "Public message broadcast"
        );

        Ok(stored)
    }

    /// Deliver a private message to a live recipient
    ///
    /// Not persisted. The payload goes to every connection of the
    /// recipient, and an echo marked as the sender's own copy goes to
    /// every connection of the sender.
    ///
    /// # Errors
    /// [`RouteError::Validation`] for rejected text,
    /// [`RouteError::RecipientOffline`] if the recipient has no live
    /// connections (checked before anything is delivered).
    #[instrument(skip(self, author, raw_text), fields(connection_id = %author.connection_id()))]
    pub fn send_private(
        &self,
        author: &Connection,
        recipient_id: Snowflake,
        raw_text: &str,
    ) -> Result<PrivateMessagePayload, RouteError> {
        let text = MessageText::new(raw_text).map_err(RouteError::Validation)?;

        let recipients = self.registry.connections_for(recipient_id);
        if recipients.is_empty() {
            return Err(RouteError::RecipientOffline);
        }

        let payload = PrivateMessagePayload {
            id: self.id_generator.generate(),
            from: author.username().to_string(),
            from_user_id: author.user_id(),
            to_user_id: recipient_id,
            text: text.into_inner(),
            timestamp: Utc::now(),
            is_own_message: None,
        };

        let envelope = EventEnvelope::new(
            EventName::PrivateMessage,
            serde_json::to_value(&payload).unwrap_or_default(),
        );
        let delivered = recipients
            .iter()
            .filter(|conn| conn.try_send(envelope.clone()))
            .count();

        // Echo to every one of the sender's own connections, flagged so
        // clients can render it as outgoing.
        let echo = EventEnvelope::new(
            EventName::PrivateMessage,
            serde_json::to_value(payload.marked_own()).unwrap_or_default(),
        );
        let echoed = self
            .registry
            .connections_for(author.user_id())
            .iter()
            .filter(|conn| conn.try_send(echo.clone()))
            .count();

        tracing::debug!(
            message_id = %payload.id,
            from = %payload.from_user_id,
            to = %payload.to_user_id,
            delivered,
            echoed,
            "Private message delivered"
        );

        Ok(payload)
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionState;
    use crate::testing::{admit, FailingMessageRepository, InMemoryMessageRepository};
    use relay_core::Identity;
    use tokio::sync::mpsc;

    fn router_with(
        registry: &Arc<SessionRegistry>,
        repo: Arc<dyn MessageRepository>,
    ) -> MessageRouter {
        MessageRouter::new(registry.clone(), repo, Arc::new(SnowflakeGenerator::new(1)))
    }

    fn recv_envelope(rx: &mut mpsc::Receiver<EventEnvelope>) -> EventEnvelope {
        rx.try_recv().expect("expected a delivered envelope")
    }

    #[tokio::test]
    async fn test_public_message_sanitized_persisted_broadcast() {
        let registry = SessionRegistry::new_shared();
        let repo = Arc::new(InMemoryMessageRepository::new());
        let router = router_with(&registry, repo.clone());

        let (alice, mut alice_rx) = admit(&registry, 1, "alice");
        let (_bob, mut bob_rx) = admit(&registry, 2, "bob");

        let stored = router
            .send_public(&alice, "  <b>hi</b> there  ")
            .await
            .unwrap();
        assert_eq!(stored.text, "hi there");
        assert_eq!(repo.stored().len(), 1);

        for rx in [&mut alice_rx, &mut bob_rx] {
            let envelope = recv_envelope(rx);
            assert_eq!(envelope.event, "chat message");
            let data = envelope.data.unwrap();
            assert_eq!(data["text"], "hi there");
            assert_eq!(data["username"], "alice");
            assert_eq!(data["userId"], "1");
        }
    }

    #[tokio::test]
    async fn test_multi_device_receives_broadcast_once_each() {
        let registry = SessionRegistry::new_shared();
        let router = router_with(&registry, Arc::new(InMemoryMessageRepository::new()));

        let (sender, _sender_rx) = admit(&registry, 1, "alice");
        let (_phone, mut phone_rx) = admit(&registry, 2, "bob");
        let (_laptop, mut laptop_rx) = admit(&registry, 2, "bob");

        router.send_public(&sender, "hello").await.unwrap();

        for rx in [&mut phone_rx, &mut laptop_rx] {
            let envelope = recv_envelope(rx);
            assert_eq!(envelope.event, "chat message");
            assert!(rx.try_recv().is_err(), "exactly one copy per connection");
        }
    }

    #[tokio::test]
    async fn test_public_validation_rejects_before_store() {
        let registry = SessionRegistry::new_shared();
        let repo = Arc::new(InMemoryMessageRepository::new());
        let router = router_with(&registry, repo.clone());

        let (alice, mut alice_rx) = admit(&registry, 1, "alice");

        let empty = router.send_public(&alice, "   ").await.unwrap_err();
        assert!(matches!(
            empty,
            RouteError::Validation(DomainError::EmptyMessage)
        ));

        let long = "x".repeat(1001);
        let too_long = router.send_public(&alice, &long).await.unwrap_err();
        assert!(matches!(
            too_long,
            RouteError::Validation(DomainError::MessageTooLong { max: 1000 })
        ));

        let exactly = "y".repeat(1000);
        router.send_public(&alice, &exactly).await.unwrap();

        assert_eq!(repo.stored().len(), 1);
        assert_eq!(recv_envelope(&mut alice_rx).event, "chat message");
    }

    #[tokio::test]
    async fn test_store_failure_means_no_broadcast() {
        let registry = SessionRegistry::new_shared();
        let router = router_with(&registry, Arc::new(FailingMessageRepository));

        let (alice, mut alice_rx) = admit(&registry, 1, "alice");
        let (_bob, mut bob_rx) = admit(&registry, 2, "bob");

        let err = router.send_public(&alice, "hello").await.unwrap_err();
        assert!(matches!(err, RouteError::Persistence(_)));
        assert_eq!(err.to_string(), "Failed to send message");

        assert!(alice_rx.try_recv().is_err());
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_private_message_routed_to_recipient_and_echoed() {
        let registry = SessionRegistry::new_shared();
        let repo = Arc::new(InMemoryMessageRepository::new());
        let router = router_with(&registry, repo.clone());

        let (alice, mut alice_rx) = admit(&registry, 1, "alice");
        let (_bob, mut bob_rx) = admit(&registry, 2, "bob");
        let (_carol, mut carol_rx) = admit(&registry, 3, "carol");

        router
            .send_private(&alice, Snowflake::new(2), "hello")
            .unwrap();

        let to_bob = recv_envelope(&mut bob_rx);
        assert_eq!(to_bob.event, "private message");
        let data = to_bob.data.unwrap();
        assert_eq!(data["text"], "hello");
        assert_eq!(data["from"], "alice");
        assert_eq!(data["fromUserId"], "1");
        assert_eq!(data["toUserId"], "2");
        assert!(data.get("isOwnMessage").is_none());

        let echo = recv_envelope(&mut alice_rx);
        let data = echo.data.unwrap();
        assert_eq!(data["text"], "hello");
        assert_eq!(data["isOwnMessage"], true);

        assert!(carol_rx.try_recv().is_err(), "third parties see nothing");
        assert!(repo.stored().is_empty(), "private messages are not persisted");
    }

    #[tokio::test]
    async fn test_private_echo_reaches_all_sender_devices() {
        let registry = SessionRegistry::new_shared();
        let router = router_with(&registry, Arc::new(InMemoryMessageRepository::new()));

        let (alice_phone, mut phone_rx) = admit(&registry, 1, "alice");
        let (_alice_laptop, mut laptop_rx) = admit(&registry, 1, "alice");
        let (_bob, mut bob_rx) = admit(&registry, 2, "bob");

        router
            .send_private(&alice_phone, Snowflake::new(2), "psst")
            .unwrap();

        assert_eq!(recv_envelope(&mut bob_rx).event, "private message");
        for rx in [&mut phone_rx, &mut laptop_rx] {
            let data = recv_envelope(rx).data.unwrap();
            assert_eq!(data["isOwnMessage"], true);
        }
    }

    #[tokio::test]
    async fn test_private_to_offline_recipient_refused() {
        let registry = SessionRegistry::new_shared();
        let repo = Arc::new(InMemoryMessageRepository::new());
        let router = router_with(&registry, repo.clone());

        let (alice, mut alice_rx) = admit(&registry, 1, "alice");

        let err = router
            .send_private(&alice, Snowflake::new(99), "anyone there?")
            .unwrap_err();
        assert!(matches!(err, RouteError::RecipientOffline));
        assert_eq!(err.to_string(), "Recipient is not online");

        assert!(alice_rx.try_recv().is_err(), "no echo without a recipient");
        assert!(repo.stored().is_empty());
    }

    #[tokio::test]
    async fn test_private_ids_are_monotonic() {
        let registry = SessionRegistry::new_shared();
        let router = router_with(&registry, Arc::new(InMemoryMessageRepository::new()));

        let (alice, _alice_rx) = admit(&registry, 1, "alice");
        let (_bob, _bob_rx) = admit(&registry, 2, "bob");

        let first = router
            .send_private(&alice, Snowflake::new(2), "one")
            .unwrap();
        let second = router
            .send_private(&alice, Snowflake::new(2), "two")
            .unwrap();

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_full_outbox_counts_as_failed_delivery_only() {
        let registry = SessionRegistry::new_shared();
        let router = router_with(&registry, Arc::new(InMemoryMessageRepository::new()));

        let (alice, mut alice_rx) = admit(&registry, 1, "alice");

        // Bob's outbox holds a single event and is already full.
        let (tx, mut bob_rx) = mpsc::channel(1);
        let bob = Connection::new(
            Identity {
                id: Snowflake::new(2),
                username: "bob".to_string(),
            },
            tx,
        );
        bob.transition_to(ConnectionState::Authenticated);
        registry.add(bob.clone()).unwrap();
        assert!(bob.try_send(EventEnvelope::error("placeholder")));

        let stored = router.send_public(&alice, "hello").await.unwrap();
        assert_eq!(stored.text, "hello");

        // Alice still got her copy; Bob's queue only holds the placeholder.
        assert_eq!(recv_envelope(&mut alice_rx).event, "chat message");
        assert_eq!(recv_envelope(&mut bob_rx).event, "error");
        assert!(bob_rx.try_recv().is_err());
    }
}
