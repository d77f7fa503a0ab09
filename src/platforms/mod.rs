// src/platforms/mod.rs - Chat platform capability trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::types::ChatMessage;

pub mod telegram;

/// A chat-platform API call that failed. These are always recovered locally:
/// the moderation path logs them and moves on, it never surfaces them to the
/// user whose message triggered the action.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("platform rejected the call: {0}")]
    Api(String),
}

/// Interface every platform connection must implement: an inbound message
/// stream plus the moderation calls the bot takes on violations.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Connect to the platform and start receiving messages.
    async fn connect(&mut self) -> Result<(), PlatformError>;

    /// Platform identifier (e.g. "telegram").
    fn platform_name(&self) -> &str;

    /// Receiver for incoming messages, available after a successful connect.
    fn message_receiver(&self) -> Option<broadcast::Receiver<ChatMessage>>;

    /// Whether the connection is healthy.
    async fn is_connected(&self) -> bool;

    /// Send a plain text message to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), PlatformError>;

    /// Delete a single message from a chat.
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), PlatformError>;

    /// Permanently remove a user from a chat.
    async fn ban_user(&self, chat_id: i64, user_id: i64) -> Result<(), PlatformError>;

    /// Revoke a user's send permission until the given time.
    async fn restrict_user(
        &self,
        chat_id: i64,
        user_id: i64,
        until: DateTime<Utc>,
    ) -> Result<(), PlatformError>;

    /// Gracefully disconnect.
    async fn disconnect(&mut self) -> Result<(), PlatformError>;
}
