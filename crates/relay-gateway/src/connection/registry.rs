//! Session registry
//!
//! The authoritative record of live connections. A single lock guards
//! both the primary map and the identity index, so the two can never be
//! observed out of step and every snapshot reflects one real instant.
//! Snapshot methods copy and release before returning; fan-out never runs
//! under the lock.

use super::Connection;
use parking_lot::RwLock;
use relay_core::Snowflake;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// A connection id was registered twice
///
/// Connection ids are freshly generated per socket, so this indicates a
/// programming error; it is logged and the admission is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Connection {0} is already registered")]
pub struct DuplicateConnection(pub Uuid);

#[derive(Default)]
struct RegistryInner {
    /// Primary map: connection id to connection
    connections: HashMap<Uuid, Arc<Connection>>,

    /// Identity index: identity id to its live connection ids
    by_identity: HashMap<Snowflake, HashSet<Uuid>>,
}

/// Registry of all admitted connections
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Create an empty registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert a connection into both mappings atomically
    ///
    /// # Errors
    /// Returns [`DuplicateConnection`] if the id is already present;
    /// neither mapping is modified in that case.
    pub fn add(&self, connection: Arc<Connection>) -> Result<(), DuplicateConnection> {
        let connection_id = connection.connection_id();
        let user_id = connection.user_id();

        let mut inner = self.inner.write();
        if inner.connections.contains_key(&connection_id) {
            tracing::error!(
                connection_id = %connection_id,
                "Duplicate connection id in registry"
            );
            return Err(DuplicateConnection(connection_id));
        }

        inner
            .by_identity
            .entry(user_id)
            .or_default()
            .insert(connection_id);
        inner.connections.insert(connection_id, connection);

        tracing::debug!(
            connection_id = %connection_id,
            user_id = %user_id,
            "Connection registered"
        );

        Ok(())
    }

    /// Remove a connection from both mappings atomically
    ///
    /// Returns the removed connection, or None if the id was not present.
    /// The None case is the idempotence gate for retire.
    pub fn remove(&self, connection_id: Uuid) -> Option<Arc<Connection>> {
        let mut inner = self.inner.write();
        let connection = inner.connections.remove(&connection_id)?;

        let user_id = connection.user_id();
        if let Some(ids) = inner.by_identity.get_mut(&user_id) {
            ids.remove(&connection_id);
            if ids.is_empty() {
                inner.by_identity.remove(&user_id);
            }
        }

        tracing::debug!(
            connection_id = %connection_id,
            user_id = %user_id,
            "Connection removed"
        );

        Some(connection)
    }

    /// Snapshot of every live connection for one identity
    ///
    /// Empty if the identity has no connections.
    pub fn connections_for(&self, identity_id: Snowflake) -> Vec<Arc<Connection>> {
        let inner = self.inner.read();
        inner
            .by_identity
            .get(&identity_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.connections.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot of every live connection, ordered by admission time then
    /// connection id
    ///
    /// The ordering is stable within one call; presence dedup relies on it
    /// to pick the same representative connection per identity.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        let mut snapshot: Vec<Arc<Connection>> = {
            let inner = self.inner.read();
            inner.connections.values().cloned().collect()
        };
        snapshot.sort_by_key(|conn| (conn.joined_at(), conn.connection_id()));
        snapshot
    }

    /// Check if a connection id is registered
    pub fn contains(&self, connection_id: Uuid) -> bool {
        self.inner.read().connections.contains_key(&connection_id)
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.inner.read().connections.len()
    }

    /// Number of distinct identities with at least one connection
    pub fn identity_count(&self) -> usize {
        self.inner.read().by_identity.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("SessionRegistry")
            .field("connections", &inner.connections.len())
            .field("identities", &inner.by_identity.len())
            .finish()
    }
}
