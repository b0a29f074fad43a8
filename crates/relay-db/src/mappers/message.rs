//! Message entity <-> model mapper

use chrono::{DateTime, Utc};
use relay_core::entities::{Message, Visibility};
use relay_core::value_objects::Snowflake;

use crate::models::MessageModel;

/// Convert MessageModel to Message entity
impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        Message {
            id: Snowflake::new(model.id),
            author_id: Snowflake::new(model.author_id),
            author_name: model.author_name,
            text: model.text,
            // The column carries a CHECK constraint; an unknown value cannot
            // come back from the store.
            visibility: Visibility::parse(&model.visibility).unwrap_or(Visibility::Public),
            recipient_id: model.recipient_id.map(Snowflake::new),
            created_at: model.created_at,
            edited_at: model.edited_at,
        }
    }
}

/// Convert Message entity reference to values for database insertion
pub struct MessageInsert<'a> {
    pub id: i64,
    pub author_id: i64,
    pub author_name: &'a str,
    pub text: &'a str,
    pub visibility: &'static str,
    pub recipient_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl<'a> MessageInsert<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self {
            id: message.id.into_inner(),
            author_id: message.author_id.into_inner(),
            author_name: &message.author_name,
            text: &message.text,
            visibility: message.visibility.as_str(),
            recipient_id: message.recipient_id.map(Snowflake::into_inner),
            created_at: message.created_at,
        }
    }
}
