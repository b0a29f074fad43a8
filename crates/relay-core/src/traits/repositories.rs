//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs; the infrastructure layer
//! provides the implementation. The message trait is the durable-store
//! boundary the router and the history endpoints talk to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Message, NewMessage, User};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>>;

    /// Find user by username (stored lowercase)
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;

    /// Check if a username is already taken
    async fn username_exists(&self, username: &str) -> RepoResult<bool>;

    /// Create a new user; the password hash is stored but never part of the entity
    async fn create(&self, user: &User, password_hash: &str) -> RepoResult<()>;

    /// Get password hash for authentication
    async fn get_password_hash(&self, id: Snowflake) -> RepoResult<Option<String>>;

    /// Reset the failure counter and stamp a successful login
    async fn record_login_success(&self, id: Snowflake) -> RepoResult<()>;

    /// Bump the failure counter, locking the account until `lock_until`
    /// once `lock_threshold` failures accumulate. Returns the new counter.
    async fn record_login_failure(
        &self,
        id: Snowflake,
        lock_threshold: i32,
        lock_until: DateTime<Utc>,
    ) -> RepoResult<i32>;
}

// ============================================================================
// Message Repository (durable-store boundary)
// ============================================================================

/// Pagination options for history queries
///
/// `before` is an exclusive timestamp cursor; results are newest-first and
/// the caller re-orders for display.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryQuery {
    pub before: Option<DateTime<Utc>>,
    pub limit: i64,
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message, assigning its id and timestamp
    async fn insert(&self, message: NewMessage) -> RepoResult<Message>;

    /// Find message by ID (soft-deleted messages are absent)
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>>;

    /// Public history, newest-first
    async fn query_recent(&self, query: HistoryQuery) -> RepoResult<Vec<Message>>;

    /// History visible to one identity (public, authored, or received),
    /// newest-first
    async fn query_for_identity(
        &self,
        identity_id: Snowflake,
        query: HistoryQuery,
    ) -> RepoResult<Vec<Message>>;

    /// Soft delete a message
    ///
    /// # Errors
    /// [`DomainError::MessageNotFound`] if absent or already deleted.
    async fn delete(&self, id: Snowflake) -> RepoResult<()>;
}
