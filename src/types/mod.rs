// src/types/mod.rs - Core message and verdict types shared across the bot

use serde::{Deserialize, Serialize};

/// Kind of chat a message arrived from. Moderation only applies to group
/// chats; the admin command surface only answers in private chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    /// Map the Bot API `chat.type` string onto our enum. Unknown values are
    /// treated as channels, which the moderation path ignores.
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "private" => ChatKind::Private,
            "group" => ChatKind::Group,
            "supergroup" => ChatKind::Supergroup,
            _ => ChatKind::Channel,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// Author of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAuthor {
    pub id: i64,
    pub username: Option<String>,
    pub full_name: String,
    pub is_bot: bool,
}

impl MessageAuthor {
    /// How the user is named in chat notifications: `@username` when one is
    /// set, otherwise `full_name/id`.
    pub fn mention(&self) -> String {
        match &self.username {
            Some(name) => format!("@{}", name),
            None => format!("{}/{}", self.full_name, self.id),
        }
    }
}

/// A message received from the chat platform, normalized into the shape the
/// moderation and command layers work with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub chat_kind: ChatKind,
    pub author: MessageAuthor,
    /// Message text, or the caption for media messages. `None` for messages
    /// carrying neither (stickers, joins, ...).
    pub text: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ChatMessage {
    /// Text the filters run against: text or caption, empty when absent.
    pub fn filter_text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Outcome of evaluating one message against the rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing matched.
    Clean,
    /// The message carried a link whose domain is not whitelisted.
    ForbiddenLink { domain: String },
    /// The message contained a forbidden word as a standalone token.
    ForbiddenWord { word: String },
}
