// src/bot/commands.rs - Privileged command surface for editing the rule set

use log::{error, info, warn};
use std::sync::Arc;

use crate::platforms::ChatPlatform;
use crate::rules::RuleStore;
use crate::types::{ChatKind, ChatMessage};

/// Handles `/commands`. Rule-set edits are accepted only in a private chat
/// with a privileged user; every accepted edit is persisted immediately.
pub struct AdminCommands {
    store: Arc<RuleStore>,
    platform: Arc<dyn ChatPlatform>,
}

impl AdminCommands {
    pub fn new(store: Arc<RuleStore>, platform: Arc<dyn ChatPlatform>) -> Self {
        Self { store, platform }
    }

    /// Try to handle the message as a command. Returns `true` when the
    /// message was consumed; anything else falls through to moderation.
    pub async fn handle(&self, msg: &ChatMessage) -> bool {
        let Some((command, args)) = parse_command(msg.filter_text()) else {
            return false;
        };

        match command.as_str() {
            "start" | "help" => {
                if self.hidden_in_private(msg).await {
                    return true;
                }
                self.reply(
                    msg,
                    "Hi! I'm Dante, the group moderator. Use /dante for the command list.",
                )
                .await;
                true
            }
            "dante" => {
                if self.hidden_in_private(msg).await {
                    return true;
                }
                self.reply(
                    msg,
                    "📌 Bot commands:\n\n\
                     /admin - rule management overview (direct message, privileged users)\n\
                     /dante - show this list\n\n\
                     In groups:\n\
                     - Mute for forbidden words\n\
                     - Ban for forbidden links\n\
                     - Whitelisted link domains",
                )
                .await;
                true
            }
            "admin" => {
                if msg.chat_kind != ChatKind::Private {
                    self.reply(msg, "⚠️ Use /admin in a direct message.").await;
                    return true;
                }
                if !self.store.is_privileged(msg.author.id).await {
                    return true;
                }
                self.reply(
                    msg,
                    "⚙️ Rule management:\n\
                     /addword <word> - forbid a word\n\
                     /delword <word> - allow a word again\n\
                     /words - list forbidden words\n\
                     /addlink <domain> - whitelist a link domain\n\
                     /dellink <domain> - remove a whitelisted domain\n\
                     /links - list whitelisted domains\n\
                     /setmute <minutes> - set mute duration\n\
                     /addadmin <user id> - grant admin rights\n\
                     /deladmin <user id> - revoke admin rights\n\
                     /admins - list admins",
                )
                .await;
                true
            }
            "addword" | "delword" | "words" | "addlink" | "dellink" | "links" | "setmute"
            | "addadmin" | "deladmin" | "admins" => {
                // Edits only in a private chat; in a group the text falls
                // through to moderation like any other message.
                if msg.chat_kind != ChatKind::Private {
                    return false;
                }
                if !self.store.is_privileged(msg.author.id).await {
                    return true;
                }
                self.handle_edit(&command, &args, msg).await;
                true
            }
            _ => false,
        }
    }

    async fn handle_edit(&self, command: &str, args: &[&str], msg: &ChatMessage) {
        match command {
            "addword" => {
                let word = args.join(" ");
                if word.trim().is_empty() {
                    self.reply(msg, "Usage: /addword <word>").await;
                    return;
                }
                if self.store.add_word(&word).await {
                    let note = self.persist(msg).await;
                    self.reply(msg, &format!("✅ Word '{}' is now forbidden.{}", word.trim().to_lowercase(), note))
                        .await;
                } else {
                    self.reply(msg, "That word is already on the list.").await;
                }
            }
            "delword" => {
                let word = args.join(" ");
                if word.trim().is_empty() {
                    self.reply(msg, "Usage: /delword <word>").await;
                    return;
                }
                if self.store.remove_word(&word).await {
                    let note = self.persist(msg).await;
                    self.reply(msg, &format!("🗑️ Word '{}' removed.{}", word.trim().to_lowercase(), note))
                        .await;
                } else {
                    self.reply(msg, "That word is not on the list.").await;
                }
            }
            "words" => {
                let words = self.store.snapshot().await.forbidden_words;
                if words.is_empty() {
                    self.reply(msg, "📜 The forbidden word list is empty.").await;
                } else {
                    self.reply(msg, &format!("📜 Forbidden words: {}", words.join(", ")))
                        .await;
                }
            }
            "addlink" => {
                let Some(suffix) = args.first() else {
                    self.reply(msg, "Usage: /addlink <domain>").await;
                    return;
                };
                if self.store.add_allowed_link(suffix).await {
                    let note = self.persist(msg).await;
                    self.reply(
                        msg,
                        &format!("✅ Links with domain '{}' are now allowed.{}", suffix.to_lowercase(), note),
                    )
                    .await;
                } else {
                    self.reply(msg, "That domain is already whitelisted.").await;
                }
            }
            "dellink" => {
                let Some(suffix) = args.first() else {
                    self.reply(msg, "Usage: /dellink <domain>").await;
                    return;
                };
                if self.store.remove_allowed_link(suffix).await {
                    let note = self.persist(msg).await;
                    self.reply(
                        msg,
                        &format!("🗑️ Domain '{}' removed from the whitelist.{}", suffix.to_lowercase(), note),
                    )
                    .await;
                } else {
                    self.reply(msg, "That domain is not whitelisted.").await;
                }
            }
            "links" => {
                let links = self.store.snapshot().await.allowed_links;
                if links.is_empty() {
                    self.reply(msg, "📜 No link domains are whitelisted.").await;
                } else {
                    self.reply(msg, &format!("📜 Allowed link domains: {}", links.join(", ")))
                        .await;
                }
            }
            "setmute" => {
                let minutes = args.first().and_then(|a| a.parse::<u64>().ok());
                match minutes {
                    Some(m) if m > 0 => {
                        self.store.set_mute_minutes(m).await;
                        let note = self.persist(msg).await;
                        self.reply(msg, &format!("⏱️ Mute duration set to {} minutes.{}", m, note))
                            .await;
                    }
                    _ => {
                        self.reply(msg, "⚠️ Mute duration must be a positive number of minutes.")
                            .await;
                    }
                }
            }
            "addadmin" => {
                let Some(user_id) = args.first().and_then(|a| a.parse::<i64>().ok()) else {
                    self.reply(msg, "Usage: /addadmin <user id>").await;
                    return;
                };
                if self.store.add_admin(user_id).await {
                    let note = self.persist(msg).await;
                    self.reply(msg, &format!("👥 User {} is now an admin.{}", user_id, note))
                        .await;
                } else {
                    self.reply(msg, "That user already has admin rights.").await;
                }
            }
            "deladmin" => {
                let Some(user_id) = args.first().and_then(|a| a.parse::<i64>().ok()) else {
                    self.reply(msg, "Usage: /deladmin <user id>").await;
                    return;
                };
                if self.store.remove_admin(user_id).await {
                    let note = self.persist(msg).await;
                    self.reply(msg, &format!("👥 User {} is no longer an admin.{}", user_id, note))
                        .await;
                } else {
                    self.reply(msg, "That user is not an admin.").await;
                }
            }
            "admins" => {
                let admins = self.store.snapshot().await.admins;
                if admins.is_empty() {
                    self.reply(msg, "👥 No admins besides the owner.").await;
                } else {
                    let list = admins
                        .iter()
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    self.reply(msg, &format!("👥 Admins: {}", list)).await;
                }
            }
            _ => {}
        }
    }

    /// Flush the rule set after an accepted edit. A failed save keeps the
    /// in-memory change and is reported back to the admin.
    async fn persist(&self, msg: &ChatMessage) -> &'static str {
        match self.store.save().await {
            Ok(()) => {
                info!("Rule set persisted after edit by {}", msg.author.id);
                ""
            }
            Err(e) => {
                error!("Failed to persist rule set: {}", e);
                "\n⚠️ Writing the rule file failed; the change is active but not saved."
            }
        }
    }

    /// Greeting commands are not answered in a private chat with a
    /// non-privileged user, matching the bot's quiet-by-default posture.
    async fn hidden_in_private(&self, msg: &ChatMessage) -> bool {
        msg.chat_kind == ChatKind::Private && !self.store.is_privileged(msg.author.id).await
    }

    async fn reply(&self, msg: &ChatMessage, text: &str) {
        if let Err(e) = self.platform.send_message(msg.chat_id, text).await {
            warn!("Failed to send command reply to chat {}: {}", msg.chat_id, e);
        }
    }
}

/// Split "/cmd@BotName arg1 arg2" into ("cmd", ["arg1", "arg2"]).
fn parse_command(text: &str) -> Option<(String, Vec<&str>)> {
    let mut parts = text.split_whitespace();
    let first = parts.next()?;
    let command = first.strip_prefix('/')?;
    if command.is_empty() {
        return None;
    }
    // In groups, clients append the bot's handle: "/words@dante_bot".
    let command = command.split('@').next().unwrap_or(command).to_lowercase();
    Some((command, parts.collect()))
}
