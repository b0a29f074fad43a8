//! Message entity - a stored or routed chat message

use chrono::{DateTime, Utc};

use crate::entities::Identity;
use crate::value_objects::{MessageText, Snowflake};

/// Message visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// Stable string form used by the store
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    /// Parse the store's string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message entity
///
/// `author_name` is denormalized at send time so history renders without a
/// join, matching how the broadcast payload carries the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Snowflake,
    pub author_id: Snowflake,
    pub author_name: String,
    pub text: String,
    pub visibility: Visibility,
    pub recipient_id: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl Message {
    #[inline]
    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    #[inline]
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }
}

/// A validated message awaiting persistence; the store assigns id and
/// timestamp at insert.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub author_id: Snowflake,
    pub author_name: String,
    pub text: String,
    pub visibility: Visibility,
    pub recipient_id: Option<Snowflake>,
}

impl NewMessage {
    /// A public message from the given author
    pub fn public(author: &Identity, text: MessageText) -> Self {
        Self {
            author_id: author.id,
            author_name: author.username.clone(),
            text: text.into_inner(),
            visibility: Visibility::Public,
            recipient_id: None,
        }
    }

    /// A private message from the given author to a recipient
    pub fn private(author: &Identity, recipient_id: Snowflake, text: MessageText) -> Self {
        Self {
            author_id: author.id,
            author_name: author.username.clone(),
            text: text.into_inner(),
            visibility: Visibility::Private,
            recipient_id: Some(recipient_id),
        }
    }
}
