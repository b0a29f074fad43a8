//! Event payload definitions
//!
//! Wire shapes for each event. Field names are camelCase on the wire;
//! snowflake ids serialize as decimal strings, timestamps as RFC 3339.

use chrono::{DateTime, Utc};
use relay_core::{Identity, Message, Snowflake};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// === Client Payloads ===

/// `chat message` sent by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessagePayload {
    /// Raw message text, sanitized server-side
    pub text: String,
}

/// `private message` sent by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPrivatePayload {
    /// Recipient identity id
    pub to_user_id: Snowflake,
    /// Raw message text, sanitized server-side
    pub text: String,
}

// === Server Payloads ===

/// `chat message` broadcast: a stored public message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: Snowflake,
    pub username: String,
    pub user_id: Snowflake,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for MessagePayload {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            username: message.author_name.clone(),
            user_id: message.author_id,
            text: message.text.clone(),
            timestamp: message.created_at,
        }
    }
}

/// `private message` delivery
///
/// Sent to every connection of the recipient, and echoed to every
/// connection of the sender with `isOwnMessage: true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessagePayload {
    pub id: Snowflake,
    /// Sender display name
    pub from: String,
    pub from_user_id: Snowflake,
    pub to_user_id: Snowflake,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Present (true) only on the sender's own echo copy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_own_message: Option<bool>,
}

impl PrivateMessagePayload {
    /// Copy of this payload marked as the sender's own echo
    #[must_use]
    pub fn marked_own(&self) -> Self {
        let mut own = self.clone();
        own.is_own_message = Some(true);
        own
    }
}

/// `user typing` / `user stopped typing` notification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub username: String,
    pub user_id: Snowflake,
}

impl From<&Identity> for TypingPayload {
    fn from(identity: &Identity) -> Self {
        Self {
            username: identity.username.clone(),
            user_id: identity.id,
        }
    }
}

/// `user joined` / `user left` notification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPayload {
    pub username: String,
    pub user_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

impl MembershipPayload {
    #[must_use]
    pub fn new(identity: &Identity, timestamp: DateTime<Utc>) -> Self {
        Self {
            username: identity.username.clone(),
            user_id: identity.id,
            timestamp,
        }
    }
}

/// One entry of the `online users` roster
///
/// An identity appears once no matter how many connections it holds;
/// `socketId` is its first connection id in snapshot order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUserPayload {
    pub id: Snowflake,
    pub username: String,
    pub socket_id: Uuid,
}

/// `error` payload sent to the originating client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl ErrorPayload {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use relay_core::Visibility;

    fn sample_identity() -> Identity {
        Identity {
            id: Snowflake::new(42),
            username: "alice".to_string(),
        }
    }

    #[test]
    fn test_message_payload_from_stored_message() {
        let message = Message {
            id: Snowflake::new(7),
            author_id: Snowflake::new(42),
            author_name: "alice".to_string(),
            text: "hello".to_string(),
            visibility: Visibility::Public,
            recipient_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            edited_at: None,
        };

        let payload = MessagePayload::from(&message);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["id"], "7");
        assert_eq!(json["username"], "alice");
        assert_eq!(json["userId"], "42");
        assert_eq!(json["text"], "hello");
        assert!(json["timestamp"].as_str().unwrap().starts_with("2025-06-01T12:00:00"));
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_private_payload_own_echo_flag() {
        let payload = PrivateMessagePayload {
            id: Snowflake::new(9),
            from: "alice".to_string(),
            from_user_id: Snowflake::new(42),
            to_user_id: Snowflake::new(43),
            text: "psst".to_string(),
            timestamp: Utc::now(),
            is_own_message: None,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("isOwnMessage").is_none());
        assert_eq!(json["fromUserId"], "42");
        assert_eq!(json["toUserId"], "43");

        let own = payload.marked_own();
        let json = serde_json::to_value(&own).unwrap();
        assert_eq!(json["isOwnMessage"], true);
        assert_eq!(json["text"], "psst");
    }

    #[test]
    fn test_typing_payload_from_identity() {
        let payload = TypingPayload::from(&sample_identity());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["username"], "alice");
        assert_eq!(json["userId"], "42");
    }

    #[test]
    fn test_online_user_payload_field_names() {
        let socket_id = Uuid::new_v4();
        let payload = OnlineUserPayload {
            id: Snowflake::new(42),
            username: "alice".to_string(),
            socket_id,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["socketId"], socket_id.to_string());
        assert!(json.get("socket_id").is_none());
    }

    #[test]
    fn test_send_private_payload_accepts_string_id() {
        let payload: SendPrivatePayload =
            serde_json::from_str(r#"{"toUserId": "43", "text": "hi"}"#).unwrap();
        assert_eq!(payload.to_user_id, Snowflake::new(43));
        assert_eq!(payload.text, "hi");
    }
}
