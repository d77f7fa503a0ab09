// src/bot/actions.rs - Executes platform actions for a verdict

use chrono::{Duration, Utc};
use log::{error, info, warn};
use std::sync::Arc;

use crate::platforms::ChatPlatform;
use crate::types::{ChatMessage, Verdict};

/// Turns a verdict into platform calls. Every call is best-effort: a failed
/// delete must not prevent the ban attempt, a failed ban must not prevent the
/// notification. Failures are logged for operators and never escalate back
/// to message processing.
pub struct ActionExecutor {
    platform: Arc<dyn ChatPlatform>,
}

impl ActionExecutor {
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }

    /// Apply the verdict to the offending message.
    pub async fn apply(&self, verdict: &Verdict, msg: &ChatMessage, mute_minutes: u64) {
        match verdict {
            Verdict::Clean => {}
            Verdict::ForbiddenLink { domain } => {
                info!(
                    "Forbidden link '{}' from {} in chat {}",
                    domain,
                    msg.author.mention(),
                    msg.chat_id
                );

                if let Err(e) = self.platform.delete_message(msg.chat_id, msg.message_id).await {
                    warn!("Failed to delete message {}: {}", msg.message_id, e);
                }
                if let Err(e) = self.platform.ban_user(msg.chat_id, msg.author.id).await {
                    warn!("Failed to ban user {}: {}", msg.author.id, e);
                }

                let text = format!(
                    "🚫 User {} posted a forbidden link and was banned.",
                    msg.author.mention()
                );
                self.notify(msg.chat_id, &text).await;
            }
            Verdict::ForbiddenWord { word } => {
                info!(
                    "Forbidden word '{}' from {} in chat {}",
                    word,
                    msg.author.mention(),
                    msg.chat_id
                );

                if let Err(e) = self.platform.delete_message(msg.chat_id, msg.message_id).await {
                    warn!("Failed to delete message {}: {}", msg.message_id, e);
                }

                let until = Utc::now() + Duration::minutes(mute_minutes as i64);
                if let Err(e) = self
                    .platform
                    .restrict_user(msg.chat_id, msg.author.id, until)
                    .await
                {
                    warn!("Failed to mute user {}: {}", msg.author.id, e);
                }

                let text = format!(
                    "🔇 User {} used a forbidden word and was muted for {} minutes.",
                    msg.author.mention(),
                    mute_minutes
                );
                self.notify(msg.chat_id, &text).await;
            }
        }
    }

    async fn notify(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.platform.send_message(chat_id, text).await {
            error!("Failed to send moderation notice to chat {}: {}", chat_id, e);
        }
    }
}
