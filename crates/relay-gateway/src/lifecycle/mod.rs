//! Connection lifecycle manager
//!
//! Admission runs throttle check, token validation (time-bounded), and
//! registry insertion in that order; a connection that fails any step
//! never enters the registry. Retirement is idempotent and uses registry
//! removal as its linearization point.

use crate::auth::{AuthError, AuthThrottle, CredentialValidator};
use crate::connection::{Connection, ConnectionState, DuplicateConnection, SessionRegistry};
use crate::presence::PresenceCoordinator;
use crate::protocol::EventEnvelope;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Why an admission was refused
///
/// Every refusal closes the transport with a policy-violation Close frame
/// carrying the Display text as its reason.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Too many attempts from this address inside the window
    #[error("Too many authentication attempts, retry later")]
    Throttled,

    /// The credential was missing or refused
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Validation did not finish inside the configured timeout
    #[error("Authentication timed out")]
    TimedOut,

    /// Registry invariant violation; logged as a bug
    #[error(transparent)]
    Duplicate(#[from] DuplicateConnection),
}

/// Admits and retires gateway connections
pub struct ConnectionLifecycle {
    registry: Arc<SessionRegistry>,
    presence: Arc<PresenceCoordinator>,
    throttle: AuthThrottle,
    validator: Arc<dyn CredentialValidator>,
    auth_timeout: Duration,
}

impl ConnectionLifecycle {
    #[must_use]
    pub fn new(
        registry: Arc<SessionRegistry>,
        presence: Arc<PresenceCoordinator>,
        throttle: AuthThrottle,
        validator: Arc<dyn CredentialValidator>,
        auth_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            presence,
            throttle,
            validator,
            auth_timeout,
        }
    }

    /// Admit a new transport into the registry
    ///
    /// The throttle records the attempt before the credential service is
    /// consulted, so invalid and valid tokens count the same. On success
    /// the connection is registered, everyone else learns of the join,
    /// and the full roster is rebroadcast.
    ///
    /// # Errors
    /// [`AdmissionError`] for a throttled address, refused or missing
    /// token, validation timeout, or duplicate connection id.
    pub async fn admit(
        &self,
        address: IpAddr,
        token: Option<&str>,
        outbox: mpsc::Sender<EventEnvelope>,
    ) -> Result<Arc<Connection>, AdmissionError> {
        if !self.throttle.check(address) {
            return Err(AdmissionError::Throttled);
        }

        let token = token.ok_or(AuthError::MissingToken)?;

        let identity = tokio::time::timeout(self.auth_timeout, self.validator.validate(token))
            .await
            .map_err(|_| AdmissionError::TimedOut)??;

        let connection = Connection::new(identity, outbox);
        self.registry.add(connection.clone())?;
        connection.transition_to(ConnectionState::Authenticated);

        tracing::info!(
            connection_id = %connection.connection_id(),
            user_id = %connection.user_id(),
            username = %connection.username(),
            address = %address,
            "Connection admitted"
        );

        self.presence.announce_joined(&connection);
        self.presence.broadcast_presence();

        Ok(connection)
    }

    /// Retire a connection
    ///
    /// Safe to call any number of times for the same id; only the call
    /// that actually removes the registry entry clears typing state and
    /// broadcasts the departure.
    pub fn retire(&self, connection_id: Uuid, reason: &str) {
        let Some(connection) = self.registry.remove(connection_id) else {
            return;
        };

        connection.transition_to(ConnectionState::Closed);
        self.presence.clear_typing(&connection);

        tracing::info!(
            connection_id = %connection_id,
            user_id = %connection.user_id(),
            username = %connection.username(),
            reason,
            "Connection retired"
        );

        self.presence.announce_left(&connection);
        self.presence.broadcast_presence();
    }
}

impl std::fmt::Debug for ConnectionLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionLifecycle")
            .field("registry", &self.registry)
            .field("throttle", &self.throttle)
            .field("auth_timeout", &self.auth_timeout)
            .finish()
    }
}
