//! Gateway event names
//!
//! Event names are part of the wire contract and contain spaces; they are
//! matched byte-for-byte, never normalized.

use std::fmt;

/// Named events carried in the envelope's `event` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Public message: client sends `{text}`, server broadcasts the stored message
    ChatMessage,
    /// Private message: client sends `{toUserId, text}`, server delivers the payload
    PrivateMessage,
    /// Client started typing (no payload)
    TypingStart,
    /// Client stopped typing (no payload)
    TypingStop,
    /// Someone else started typing
    UserTyping,
    /// Someone else stopped typing
    UserStoppedTyping,
    /// A user connected
    UserJoined,
    /// A user disconnected
    UserLeft,
    /// Full roster of online users
    OnlineUsers,
    /// Operation failed; payload is `{message}`
    Error,
}

impl EventName {
    /// Get the wire name of this event
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChatMessage => "chat message",
            Self::PrivateMessage => "private message",
            Self::TypingStart => "typing start",
            Self::TypingStop => "typing stop",
            Self::UserTyping => "user typing",
            Self::UserStoppedTyping => "user stopped typing",
            Self::UserJoined => "user joined",
            Self::UserLeft => "user left",
            Self::OnlineUsers => "online users",
            Self::Error => "error",
        }
    }

    /// Parse a wire name into an event
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chat message" => Some(Self::ChatMessage),
            "private message" => Some(Self::PrivateMessage),
            "typing start" => Some(Self::TypingStart),
            "typing stop" => Some(Self::TypingStop),
            "user typing" => Some(Self::UserTyping),
            "user stopped typing" => Some(Self::UserStoppedTyping),
            "user joined" => Some(Self::UserJoined),
            "user left" => Some(Self::UserLeft),
            "online users" => Some(Self::OnlineUsers),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Check if clients are allowed to send this event
    #[must_use]
    pub const fn is_client_event(self) -> bool {
        matches!(
            self,
            Self::ChatMessage | Self::PrivateMessage | Self::TypingStart | Self::TypingStop
        )
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
