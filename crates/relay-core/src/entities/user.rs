//! User entity and the Identity it projects onto live connections

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// User account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active account with zeroed login-attempt state
    pub fn new(id: Snowflake, username: String, email: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            email,
            is_active: true,
            last_login: None,
            login_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account is currently locked out
    pub fn is_locked(&self) -> bool {
        self.locked_until.is_some_and(|until| until > Utc::now())
    }

    /// Project the account onto the identity carried by live connections
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Authenticated principal attached to a connection
///
/// Immutable for the lifetime of the connection; constructed from a
/// validated [`User`], never assembled from wire input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Snowflake,
    pub username: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        user.identity()
    }
}
