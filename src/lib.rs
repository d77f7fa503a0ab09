//! # Dante
//!
//! A Telegram group moderation bot. Dante watches group chats, deletes
//! messages that contain forbidden words or non-whitelisted links, mutes or
//! bans the offending user, and lets privileged users edit the rule set from
//! a private chat. The rule set is persisted as a single JSON file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dante::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(RuleStore::load("data.json", 12345).await?);
//!
//!     let mut connection = TelegramConnection::new(TelegramConfig::from_env()?);
//!     connection.connect().await?;
//!     let receiver = connection.message_receiver().unwrap();
//!
//!     let platform: Arc<dyn ChatPlatform> = Arc::new(connection);
//!     let bot = ModeratorBot::new(store, platform);
//!     bot.run(receiver).await;
//!
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod platforms;
pub mod rules;
pub mod types;
pub mod web;

// Re-export commonly used items
pub mod prelude {
    pub use crate::bot::ModeratorBot;
    pub use crate::config::BotConfig;
    pub use crate::platforms::{
        telegram::{TelegramConfig, TelegramConnection},
        ChatPlatform, PlatformError,
    };
    pub use crate::rules::{RuleSet, RuleStore, StorageError};
    pub use crate::types::{ChatKind, ChatMessage, MessageAuthor, Verdict};
    pub use anyhow::Result;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
