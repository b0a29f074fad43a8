//! Shared fixtures for the gateway unit tests
//!
//! In-memory message store, stub credential validator, and a helper that
//! places a ready-made authenticated connection in a registry.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use relay_core::{
    DomainError, HistoryQuery, Identity, Message, MessageRepository, NewMessage, RepoResult,
    Snowflake, Visibility,
};
use tokio::sync::mpsc;

use crate::auth::{AuthError, CredentialValidator};
use crate::connection::{Connection, ConnectionState, SessionRegistry};
use crate::protocol::EventEnvelope;

/// Outbox depth for test connections; deep enough that tests only fill it
/// on purpose.
pub(crate) const TEST_OUTBOX: usize = 32;

/// Build an authenticated connection, register it, and hand back the
/// receiving end of its outbox.
pub(crate) fn admit(
    registry: &Arc<SessionRegistry>,
    user_id: i64,
    username: &str,
) -> (Arc<Connection>, mpsc::Receiver<EventEnvelope>) {
    let (tx, rx) = mpsc::channel(TEST_OUTBOX);
    let connection = Connection::new(
        Identity {
            id: Snowflake::new(user_id),
            username: username.to_string(),
        },
        tx,
    );
    connection.transition_to(ConnectionState::Authenticated);
    registry
        .add(connection.clone())
        .expect("fresh connection id");
    (connection, rx)
}

/// Drain every envelope currently queued on a test outbox.
pub(crate) fn drain(rx: &mut mpsc::Receiver<EventEnvelope>) -> Vec<EventEnvelope> {
    let mut events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        events.push(envelope);
    }
    events
}

/// Message store backed by a mutex-guarded vec; ids are a counter so
/// ordering assertions stay deterministic.
#[derive(Default)]
pub(crate) struct InMemoryMessageRepository {
    messages: Mutex<Vec<Message>>,
    next_id: AtomicI64,
}

impl InMemoryMessageRepository {
    pub(crate) fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub(crate) fn stored(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: NewMessage) -> RepoResult<Message> {
        let stored = Message {
            id: Snowflake::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            author_id: message.author_id,
            author_name: message.author_name,
            text: message.text,
            visibility: message.visibility,
            recipient_id: message.recipient_id,
            created_at: Utc::now(),
            edited_at: None,
        };
        self.messages.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn query_recent(&self, query: HistoryQuery) -> RepoResult<Vec<Message>> {
        let mut rows: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.visibility == Visibility::Public)
            .filter(|m| query.before.is_none_or(|cursor| m.created_at < cursor))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows.truncate(usize::try_from(query.limit.max(0)).unwrap());
        Ok(rows)
    }

    async fn query_for_identity(
        &self,
        identity_id: Snowflake,
        query: HistoryQuery,
    ) -> RepoResult<Vec<Message>> {
        let mut rows: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| {
                m.visibility == Visibility::Public
                    || m.author_id == identity_id
                    || m.recipient_id == Some(identity_id)
            })
            .filter(|m| query.before.is_none_or(|cursor| m.created_at < cursor))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows.truncate(usize::try_from(query.limit.max(0)).unwrap());
        Ok(rows)
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let mut messages = self.messages.lock().unwrap();
        match messages.iter().position(|m| m.id == id) {
            Some(index) => {
                messages.remove(index);
                Ok(())
            }
            None => Err(DomainError::MessageNotFound(id)),
        }
    }
}

/// Store that refuses every operation, for persistence-failure paths.
pub(crate) struct FailingMessageRepository;

#[async_trait]
impl MessageRepository for FailingMessageRepository {
    async fn insert(&self, _message: NewMessage) -> RepoResult<Message> {
        Err(DomainError::DatabaseError("connection reset".to_string()))
    }

    async fn find_by_id(&self, _id: Snowflake) -> RepoResult<Option<Message>> {
        Err(DomainError::DatabaseError("connection reset".to_string()))
    }

    async fn query_recent(&self, _query: HistoryQuery) -> RepoResult<Vec<Message>> {
        Err(DomainError::DatabaseError("connection reset".to_string()))
    }

    async fn query_for_identity(
        &self,
        _identity_id: Snowflake,
        _query: HistoryQuery,
    ) -> RepoResult<Vec<Message>> {
        Err(DomainError::DatabaseError("connection reset".to_string()))
    }

    async fn delete(&self, _id: Snowflake) -> RepoResult<()> {
        Err(DomainError::DatabaseError("connection reset".to_string()))
    }
}

/// Validator that accepts exactly one token per identity.
pub(crate) struct StubValidator {
    accepted: Vec<(String, Identity)>,
}

impl StubValidator {
    pub(crate) fn new() -> Self {
        Self {
            accepted: Vec::new(),
        }
    }

    pub(crate) fn accept(mut self, token: &str, user_id: i64, username: &str) -> Self {
        self.accepted.push((
            token.to_string(),
            Identity {
                id: Snowflake::new(user_id),
                username: username.to_string(),
            },
        ));
        self
    }
}

#[async_trait]
impl CredentialValidator for StubValidator {
    async fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        self.accepted
            .iter()
            .find(|(accepted, _)| accepted == token)
            .map(|(_, identity)| identity.clone())
            .ok_or(AuthError::InvalidToken)
    }
}

/// Validator whose future never resolves, for auth-timeout paths.
pub(crate) struct HangingValidator;

#[async_trait]
impl CredentialValidator for HangingValidator {
    async fn validate(&self, _token: &str) -> Result<Identity, AuthError> {
        std::future::pending().await
    }
}
