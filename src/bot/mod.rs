// src/bot/mod.rs - Bot engine: routes inbound messages to commands or moderation

use log::{info, warn};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::platforms::ChatPlatform;
use crate::rules::RuleStore;
use crate::types::ChatMessage;

pub mod actions;
pub mod commands;
pub mod moderation;

use actions::ActionExecutor;
use commands::AdminCommands;
use moderation::ModerationEngine;

/// Core engine. One message is fully handled (evaluated and acted upon)
/// before the next is taken from the receiver, so rule edits arriving
/// through the command path never interleave with an evaluation.
pub struct ModeratorBot {
    store: Arc<RuleStore>,
    engine: ModerationEngine,
    executor: ActionExecutor,
    commands: AdminCommands,
}

impl ModeratorBot {
    pub fn new(store: Arc<RuleStore>, platform: Arc<dyn ChatPlatform>) -> Self {
        Self {
            engine: ModerationEngine::new(),
            executor: ActionExecutor::new(platform.clone()),
            commands: AdminCommands::new(store.clone(), platform),
            store,
        }
    }

    /// Consume messages until the platform closes the channel.
    pub async fn run(&self, mut receiver: broadcast::Receiver<ChatMessage>) {
        info!("Moderation loop started");
        loop {
            match receiver.recv().await {
                Ok(message) => self.handle_message(&message).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Moderation loop lagged, {} messages skipped", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        info!("Moderation loop stopped");
    }

    /// Handle one inbound message: other bots are ignored, commands are
    /// dispatched first, and only group messages are moderated.
    pub async fn handle_message(&self, msg: &ChatMessage) {
        if msg.author.is_bot {
            return;
        }

        if self.commands.handle(msg).await {
            return;
        }

        if !msg.chat_kind.is_group() {
            return;
        }

        let rules = self.store.snapshot().await;
        let verdict = self.engine.evaluate(msg.filter_text(), &rules);
        self.executor.apply(&verdict, msg, rules.mute_minutes).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::PlatformError;
    use crate::types::{ChatKind, MessageAuthor};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tempfile::tempdir;
    use tokio::sync::Mutex;

    const OWNER: i64 = 1000;

    #[derive(Default)]
    struct MockPlatform {
        calls: Mutex<Vec<String>>,
    }

    impl MockPlatform {
        async fn calls(&self) -> Vec<String> {
            self.calls.lock().await.clone()
        }

        async fn record(&self, call: String) -> Result<(), PlatformError> {
            self.calls.lock().await.push(call);
            Ok(())
        }
    }

    #[async_trait]
    impl ChatPlatform for MockPlatform {
        async fn connect(&mut self) -> Result<(), PlatformError> {
            Ok(())
        }

        fn platform_name(&self) -> &str {
            "mock"
        }

        fn message_receiver(&self) -> Option<broadcast::Receiver<ChatMessage>> {
            None
        }

        async fn is_connected(&self) -> bool {
            true
        }

        async fn send_message(&self, chat_id: i64, _text: &str) -> Result<(), PlatformError> {
            self.record(format!("send:{}", chat_id)).await
        }

        async fn delete_message(&self, _: i64, message_id: i64) -> Result<(), PlatformError> {
            self.record(format!("delete:{}", message_id)).await
        }

        async fn ban_user(&self, _: i64, user_id: i64) -> Result<(), PlatformError> {
            self.record(format!("ban:{}", user_id)).await
        }

        async fn restrict_user(
            &self,
            _: i64,
            user_id: i64,
            _: DateTime<Utc>,
        ) -> Result<(), PlatformError> {
            self.record(format!("restrict:{}", user_id)).await
        }

        async fn disconnect(&mut self) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    fn message(kind: ChatKind, is_bot: bool, text: &str) -> ChatMessage {
        ChatMessage {
            chat_id: -300,
            message_id: 9,
            chat_kind: kind,
            author: MessageAuthor {
                id: 42,
                username: Some("someone".to_string()),
                full_name: "Some One".to_string(),
                is_bot,
            },
            text: Some(text.to_string()),
            timestamp: Utc::now(),
        }
    }

    async fn bot_with(dir: &tempfile::TempDir) -> (Arc<RuleStore>, Arc<MockPlatform>, ModeratorBot) {
        let store = Arc::new(
            RuleStore::load(dir.path().join("data.json"), OWNER)
                .await
                .unwrap(),
        );
        let platform = Arc::new(MockPlatform::default());
        let bot = ModeratorBot::new(store.clone(), platform.clone());
        (store, platform, bot)
    }

    #[tokio::test]
    async fn test_bot_authors_are_never_evaluated() {
        let dir = tempdir().unwrap();
        let (store, platform, bot) = bot_with(&dir).await;
        store.add_word("spam").await;

        bot.handle_message(&message(ChatKind::Group, true, "spam spam"))
            .await;
        assert!(platform.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_private_messages_are_never_moderated() {
        let dir = tempdir().unwrap();
        let (store, platform, bot) = bot_with(&dir).await;
        store.add_word("spam").await;

        bot.handle_message(&message(ChatKind::Private, false, "spam http://evil.test"))
            .await;
        assert!(platform.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_group_word_violation_mutes() {
        let dir = tempdir().unwrap();
        let (store, platform, bot) = bot_with(&dir).await;
        store.add_word("spam").await;
        store.set_mute_minutes(10).await;

        bot.handle_message(&message(ChatKind::Group, false, "this is SPAM here"))
            .await;

        let calls = platform.calls().await;
        assert_eq!(calls, vec!["delete:9", "restrict:42", "send:-300"]);
    }

    #[tokio::test]
    async fn test_group_link_violation_bans() {
        let dir = tempdir().unwrap();
        let (_, platform, bot) = bot_with(&dir).await;

        bot.handle_message(&message(ChatKind::Supergroup, false, "visit http://evil.test/x"))
            .await;

        let calls = platform.calls().await;
        assert_eq!(calls, vec!["delete:9", "ban:42", "send:-300"]);
    }

    #[tokio::test]
    async fn test_clean_group_message_passes() {
        let dir = tempdir().unwrap();
        let (store, platform, bot) = bot_with(&dir).await;
        store.add_word("spam").await;

        bot.handle_message(&message(ChatKind::Group, false, "perfectly fine message"))
            .await;
        assert!(platform.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_commands_shortcut_moderation() {
        let dir = tempdir().unwrap();
        let (_, platform, bot) = bot_with(&dir).await;

        // /dante is consumed by the command layer even in a group.
        bot.handle_message(&message(ChatKind::Group, false, "/dante"))
            .await;
        let calls = platform.calls().await;
        assert_eq!(calls, vec!["send:-300"]);
    }
}
